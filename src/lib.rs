//! Gym Membership - Membership lifecycle service for gyms
//!
//! This crate onboards clients onto membership plans, renews and cancels
//! their grants, and reconciles grant statuses against the gym's calendar
//! once a day, notifying members as their memberships change.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
