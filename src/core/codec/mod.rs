// module export
pub mod registry;
pub mod text;
