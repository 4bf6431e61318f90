mod common;
mod gallery;
