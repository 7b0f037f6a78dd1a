pub mod surplus;
