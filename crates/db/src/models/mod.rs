pub mod branch;
pub mod staff_member;
