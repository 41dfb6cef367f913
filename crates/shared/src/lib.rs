pub mod dedupe;
pub mod festival;
pub mod models;
