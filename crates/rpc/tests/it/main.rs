#![allow(missing_docs)]

mod filters;

const fn main() {}
