//! World clock, unit of work, combat event handlers and the tick driver
//! for the Hollowreach simulation.
//!
//! Every tick and every player command runs inside one
//! [`UnitOfWork`](unit_of_work::UnitOfWork): state is mutated on a working
//! copy of the [`Repositories`](repository::Repositories), emitted domain
//! events are drained synchronously through the
//! [`Dispatcher`](dispatcher::Dispatcher), and the result is committed only
//! if every critical handler succeeded.
//!
//! # Modules
//!
//! - [`catalog`] -- Reference data: skills, monster templates, loot tables
//!   and items.
//! - [`clock`] -- The world tick counter.
//! - [`commands`] -- Player-facing move, skill, interaction and harvest
//!   commands.
//! - [`config`] -- Configuration loading from `hollowreach-config.yaml`.
//! - [`dispatcher`] -- Event-kind handler registry and the drain loop.
//! - [`error`] -- [`CoreError`](error::CoreError) and its failure
//!   classification.
//! - [`handlers`] -- Damage, aggro, reward, removal, placement and
//!   notification handlers.
//! - [`notification`] -- Notification outbox and delivery sinks.
//! - [`operator`] -- Pause, resume, stop and speed controls.
//! - [`persistence`] -- JSON snapshots of the committed repositories.
//! - [`repository`] -- The owned stores every aggregate lives in.
//! - [`runner`] -- Async run loop with operator controls.
//! - [`simulation`] -- [`WorldSimulation`](simulation::WorldSimulation), the
//!   tick driver.
//! - [`unit_of_work`] -- Transactional write scope over the repositories.

pub mod catalog;
pub mod clock;
pub mod commands;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod notification;
pub mod operator;
pub mod persistence;
pub mod repository;
pub mod runner;
pub mod simulation;
pub mod unit_of_work;
