use super::ExternalAccount;
use crate::util::fold_handle;

/// Finds the account a linked handle refers to.
///
/// The handle is compared case-insensitively, without its legacy discriminator, against the
/// usernames of all accounts first, then their display names, then their nicknames. The first
/// match in that order wins, so a username is never shadowed by somebody else's nickname.
pub(crate) fn resolve(accounts: &[ExternalAccount], handle: &str) -> Option<usize> {
    let wanted = fold_handle(handle);
    if wanted.is_empty() {
        return None;
    }
    let fields: [fn(&ExternalAccount) -> Option<&str>; 3] = [username, display_name, nick];
    fields.iter().find_map(|field| {
        accounts
            .iter()
            .position(|account| field(account).is_some_and(|name| fold_handle(name) == wanted))
    })
}

fn username(account: &ExternalAccount) -> Option<&str> {
    Some(&account.username)
}

fn display_name(account: &ExternalAccount) -> Option<&str> {
    account.display_name.as_deref()
}

fn nick(account: &ExternalAccount) -> Option<&str> {
    account.nick.as_deref()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use serenity::model::prelude::UserId;

    use super::*;

    fn account(
        id: u64,
        username: &str,
        display_name: Option<&str>,
        nick: Option<&str>,
    ) -> ExternalAccount {
        ExternalAccount::new(
            UserId::new(id),
            username.to_owned(),
            display_name.map(str::to_owned),
            nick.map(str::to_owned),
            HashSet::new(),
            &[],
        )
    }

    fn accounts() -> Vec<ExternalAccount> {
        vec![
            account(1, "bob", Some("Bobby"), None),
            account(2, "carol", Some("Caz"), Some("alice")),
            account(3, "alice_real", Some("Alice"), Some("Ally")),
            account(4, "dave", None, Some("Davey")),
        ]
    }

    #[test]
    fn test_legacy_discriminator_resolves_to_same_account() {
        let accounts = accounts();
        assert_eq!(resolve(&accounts, "bob#1234"), resolve(&accounts, "bob"));
        assert_eq!(resolve(&accounts, "bob#1234"), Some(0));
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(resolve(&accounts(), "BOB"), Some(0));
        assert_eq!(resolve(&accounts(), "Dave"), Some(3));
    }

    #[test]
    fn test_display_name_and_nick() {
        assert_eq!(resolve(&accounts(), "bobby"), Some(0));
        assert_eq!(resolve(&accounts(), "davey"), Some(3));
    }

    #[test]
    fn test_display_name_beats_foreign_nick() {
        // carol's nickname is "alice", but alice_real's display name is "Alice"
        let accounts = accounts();
        let idx = resolve(&accounts, "alice").unwrap();
        assert_eq!(accounts[idx].id, UserId::new(3));
    }

    #[test]
    fn test_not_found() {
        assert_eq!(resolve(&accounts(), "mallory"), None);
        assert_eq!(resolve(&accounts(), ""), None);
        assert_eq!(resolve(&accounts(), "#1234"), None);
    }
}
