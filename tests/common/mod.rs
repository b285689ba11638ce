#![allow(dead_code)]

#[allow(unused_imports)]
pub use approvaldag_test_utils::builders::{CatalogBuilder, TaskDefinitionBuilder, fan_out_catalog};
#[allow(unused_imports)]
pub use approvaldag_test_utils::{day, day_zero, init_tracing, with_timeout};
