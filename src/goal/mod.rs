//! Savings goals track money set aside towards a named target.

mod db;
mod domain;
mod endpoints;

pub use db::{
    create_goal, create_savings_goal_table, delete_goal, get_goal, list_goals, update_goal,
};
pub use domain::{GoalReport, GoalStatus, SavingsGoal};
pub use endpoints::{
    create_goal_endpoint, delete_goal_endpoint, get_goal_endpoint, list_goals_endpoint,
    update_goal_endpoint,
};
