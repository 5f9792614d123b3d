pub mod db;
pub mod text_gen;

pub use db::DbAdapter;
pub use text_gen::OpenAiTextAdapter;
