pub mod confidence_ops;
pub mod finding_ops;
pub mod maintenance;
pub mod memory_crud;
pub mod memory_query;
pub mod memory_search;
