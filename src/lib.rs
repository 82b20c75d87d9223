pub mod graph_utils;
pub mod gui;
pub mod persistence;
pub mod selection;
pub mod service;
pub mod view;
