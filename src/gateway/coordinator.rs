//! Single-flight refresh coordination.
//!
//! The first request to hit an expired credential becomes the leader and performs the only
//! refresh of the episode. Requests that fail while the leader is working enqueue a oneshot
//! handle and suspend until [`RefreshCoordinator::settle`] hands every one of them the same
//! outcome. The flag check and the enqueue happen under one short, non-async lock, so two
//! tasks can never both become leader.

// crates.io
use tokio::sync::oneshot;
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	refresh::{RefreshFailure, RefreshFailureKind},
};

/// Result of one refresh episode, cloned to every participant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RefreshOutcome {
	/// A usable access credential.
	Refreshed(TokenSecret),
	/// The episode failed; credentials have been purged.
	Failed(RefreshFailure),
}
impl RefreshOutcome {
	/// Converts the outcome into a plain result.
	pub fn into_result(self) -> Result<TokenSecret, RefreshFailure> {
		match self {
			Self::Refreshed(token) => Ok(token),
			Self::Failed(failure) => Err(failure),
		}
	}
}

#[derive(Debug, Default)]
struct CoordinatorState {
	refreshing: bool,
	waiters: Vec<oneshot::Sender<RefreshOutcome>>,
}

/// Per-gateway refresh-in-progress flag plus the queue of suspended followers.
#[derive(Debug, Default)]
pub struct RefreshCoordinator {
	state: Mutex<CoordinatorState>,
}
impl RefreshCoordinator {
	/// Becomes the episode leader when no refresh is in flight, otherwise joins the queue.
	pub fn acquire_or_enqueue(&self) -> Ticket<'_> {
		let mut state = self.state.lock();

		if state.refreshing {
			let (tx, rx) = oneshot::channel();

			state.waiters.push(tx);

			Ticket::Follower(Follower(rx))
		} else {
			state.refreshing = true;

			Ticket::Leader(LeaderGuard { coordinator: self, settled: false })
		}
	}

	/// Clears the flag and resumes every queued follower with `outcome`.
	///
	/// Intended for the leader; [`LeaderGuard::settle`] is the usual entry point. Returns the
	/// number of followers resumed. Followers that stopped waiting are skipped silently.
	pub fn settle(&self, outcome: RefreshOutcome) -> usize {
		let waiters = {
			let mut state = self.state.lock();

			state.refreshing = false;

			std::mem::take(&mut state.waiters)
		};
		let resumed = waiters.len();

		for waiter in waiters {
			let _ = waiter.send(outcome.clone());
		}

		resumed
	}

	/// Returns `true` while a leader holds the episode.
	pub fn is_refreshing(&self) -> bool {
		self.state.lock().refreshing
	}

	/// Number of followers currently suspended.
	pub fn pending(&self) -> usize {
		self.state.lock().waiters.len()
	}
}

/// Role assigned by [`RefreshCoordinator::acquire_or_enqueue`].
#[derive(Debug)]
pub enum Ticket<'a> {
	/// This task must perform the refresh and settle the episode.
	Leader(LeaderGuard<'a>),
	/// A refresh is already in flight; wait for its outcome.
	Follower(Follower),
}

/// Leadership over one refresh episode.
///
/// Dropping the guard without settling (for example when the leader's future is cancelled)
/// settles the episode as [`RefreshFailureKind::Abandoned`] so followers never hang.
#[derive(Debug)]
pub struct LeaderGuard<'a> {
	coordinator: &'a RefreshCoordinator,
	settled: bool,
}
impl LeaderGuard<'_> {
	/// Ends the episode, resuming all followers with `outcome`.
	pub fn settle(mut self, outcome: RefreshOutcome) -> usize {
		self.settled = true;

		self.coordinator.settle(outcome)
	}
}
impl Drop for LeaderGuard<'_> {
	fn drop(&mut self) {
		if !self.settled {
			self.coordinator.settle(RefreshOutcome::Failed(abandoned()));
		}
	}
}

/// Suspended follower waiting on the leader's outcome.
#[derive(Debug)]
pub struct Follower(oneshot::Receiver<RefreshOutcome>);
impl Follower {
	/// Waits for the leader to settle the episode.
	pub async fn wait(self) -> RefreshOutcome {
		self.0.await.unwrap_or_else(|_| RefreshOutcome::Failed(abandoned()))
	}
}

fn abandoned() -> RefreshFailure {
	RefreshFailure::new(RefreshFailureKind::Abandoned, "Refresh leader stopped before settling")
}
