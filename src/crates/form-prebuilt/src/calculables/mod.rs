//! Prebuilt calculable (rule) classes

pub mod condition;
pub mod summation;

pub use condition::{
    calculable_condition, condition_class, join_condition, Condition, ConditionGroup, ConditionParams, Logic,
    Operator,
};
pub use summation::{calculable_summation, summation_class};
