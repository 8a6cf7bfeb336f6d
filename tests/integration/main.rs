mod common;
mod config_test;
mod generate_test;
mod stdlib_test;
