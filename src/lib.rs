//! Finds out why component instances in a retained renderer re-rendered.
//!
//! The host renderer hands each commit to an [`Engine`], which compares every rendered instance's
//! props, state and context against its preceding render, counts the results per instance and passes them on to subscribers.
//!
//! Comparison is by identity only (see [`Value::is_same`]), so a composite value that's recreated on each render
//! is reported as changed even if its contents are equal. That's exactly the kind of wasted render this is meant to surface.

#![doc(html_root_url = "https://docs.rs/render-cause/0.0.1")]
#![warn(clippy::pedantic)]

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

pub mod aggregate;
pub mod classify;
pub mod diff;
pub mod engine;
pub mod error;
pub mod extract;
pub mod host;
pub mod options;
pub mod report;
pub mod snapshot;
pub mod value;

pub use crate::{
	aggregate::{Admission, Aggregator, PerInstanceStats, ReasonCounts, Totals},
	classify::{classify, ChangeRecord},
	diff::diff,
	engine::{Engine, EngineState},
	error::{HostError, SetupError},
	host::{Commit, CommitHook, CommitSource, HostInstance, InstanceIdentity, RenderedInstance, TreePosition},
	options::{Options, PauseSwitch},
	report::{Reporter, SubscriberFailure, SubscriberId, Subscription},
	snapshot::{ChangeReason, Name, ReasonSet, ValueSnapshot},
	value::Value,
};
