pub mod collection;
pub mod record;
pub mod utils;

// Re-export handler functions for use in routing
pub use collection::list as expenses_list;
pub use collection::total as expenses_total;
pub use collection::create as expenses_create;

pub use record::get as expense_get;
pub use record::put as expense_put;
pub use record::delete as expense_delete;
