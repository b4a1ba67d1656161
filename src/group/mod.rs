//! Groups let several users pool transactions, such as a household splitting
//! bills.

mod db;
mod domain;
mod endpoints;

pub use db::{
    add_member_by_email, create_group, create_group_tables, delete_group, get_group, get_member,
    list_groups, list_members, remove_member, update_group,
};
pub use domain::{Group, GroupMember, GroupRole, GroupWithRole};
pub use endpoints::{
    add_member_endpoint, create_group_endpoint, delete_group_endpoint, get_group_endpoint,
    list_groups_endpoint, list_members_endpoint, remove_member_endpoint, update_group_endpoint,
};
