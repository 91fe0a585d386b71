#[macro_use]
mod cfg;

#[macro_use]
mod flow;
