pub mod earnings;
pub mod history;
pub mod info;
pub mod macros;
pub mod options;
pub mod quotes;
