mod common;
mod duration;
mod validation;
