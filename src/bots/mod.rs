mod listener;

pub(crate) use listener::listen;
