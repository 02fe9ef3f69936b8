//! Web service operations of the application slice, one call enum per area so each area
//! carries its own privilege.

mod favorites;
mod files;
mod pools;
mod processes;
mod proxies;
mod queries;
mod reports;
mod rules;
mod tasks;
mod templates;
mod variables;
mod views;

pub use favorites::FavoritesCall;
pub use files::FilesCall;
pub use pools::PoolsCall;
pub use processes::ProcessesCall;
pub use proxies::ProxiesCall;
pub use queries::QueriesCall;
pub use reports::ReportsCall;
pub use rules::RulesCall;
pub use tasks::TasksCall;
pub use templates::TemplatesCall;
pub use variables::VariablesCall;
pub use views::ViewsCall;

const fn first_page() -> i64 {
    1
}

const fn any_type() -> i32 {
    -1
}
