//! Context buffers.
//!
//! A context buffer owns the transitions of past episodes of parallel environments
//! and decides which of them a controller sees before the next episode.
//! Two policies are implemented:
//!
//! * [`SlabBuffer`] keeps whole episodes. The context grows by one episode per
//!   episode until `H / horizon` episodes are held, then the oldest episode is
//!   evicted whenever a new one arrives. `H` must be a multiple of the horizon.
//! * [`FractionalBuffer`] keeps the most recent `min(H, total steps)` timesteps,
//!   regardless of episode boundaries.
//!
//! Both store episodes in an [`EpisodeRing`] of fixed capacity, so that pushing
//! an episode rotates an index instead of reallocating the history.
mod config;
mod fractional;
mod ring;
mod slab;
pub use config::ContextPolicy;
pub use fractional::FractionalBuffer;
pub use ring::EpisodeRing;
pub use slab::SlabBuffer;

use crate::{ContextBatch, Rollout};
use anyhow::Result;

/// Sliding window of past transitions.
pub trait ContextBuffer {
    /// Returns the context to be shown before the next episode.
    fn context(&self) -> Result<ContextBatch>;

    /// Adds the transitions of a completed episode.
    fn push(&mut self, rollout: &Rollout) -> Result<()>;

    /// Length of the context returned by [`ContextBuffer::context`].
    fn len(&self) -> usize;

    /// Returns `true` if the context is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The number of timesteps pushed so far.
    fn total_steps(&self) -> usize;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IcrlError;
    use ndarray::{Array2, Array3};

    const STATE_DIM: usize = 2;
    const ACTION_DIM: usize = 3;

    /// An episode whose entries encode `100 * episode + t` (state, action) and
    /// `episode` (reward, next state +0.5).
    fn rollout(num_envs: usize, horizon: usize, episode: usize) -> Rollout {
        let tag = |t: usize| (100 * episode + t) as f32;
        Rollout {
            states: Array3::from_shape_fn((num_envs, horizon, STATE_DIM), |(_, t, _)| tag(t)),
            actions: Array3::from_shape_fn((num_envs, horizon, ACTION_DIM), |(_, t, _)| tag(t)),
            next_states: Array3::from_shape_fn((num_envs, horizon, STATE_DIM), |(_, t, _)| {
                tag(t) + 0.5
            }),
            rewards: Array2::from_elem((num_envs, horizon), episode as f32),
        }
    }

    fn check_aligned(batch: &ContextBatch, num_envs: usize, len: usize) {
        assert_eq!(batch.states().dim(), (num_envs, len, STATE_DIM));
        assert_eq!(batch.actions().dim(), (num_envs, len, ACTION_DIM));
        assert_eq!(batch.next_states().dim(), (num_envs, len, STATE_DIM));
        assert_eq!(batch.rewards().dim(), (num_envs, len, 1));
    }

    /// Context lengths seen before each of `n_episodes` episodes.
    fn context_lens(buffer: &mut dyn ContextBuffer, horizon: usize, n_episodes: usize) -> Vec<usize> {
        let mut lens = vec![];
        for ep in 0..n_episodes {
            let batch = buffer.context().unwrap();
            check_aligned(&batch, 2, buffer.len());
            lens.push(batch.len());
            buffer.push(&rollout(2, horizon, ep)).unwrap();
        }
        lens
    }

    #[test]
    fn test_slab_example() {
        let mut buffer = SlabBuffer::new(20, 5, 2, STATE_DIM, ACTION_DIM).unwrap();
        let lens = context_lens(&mut buffer, 5, 10);
        assert_eq!(lens, vec![0, 5, 10, 15, 20, 20, 20, 20, 20, 20]);
        assert_eq!(buffer.n_episodes(), 4);
        assert_eq!(buffer.total_steps(), 50);
    }

    #[test]
    fn test_slab_evicts_oldest_episode() {
        let mut buffer = SlabBuffer::new(20, 5, 2, STATE_DIM, ACTION_DIM).unwrap();
        for ep in 0..6 {
            buffer.push(&rollout(2, 5, ep)).unwrap();
        }

        // Episodes 2, 3, 4 and 5 remain, oldest first
        let batch = buffer.context().unwrap();
        let rewards: Vec<f32> = batch.rewards().index_axis(ndarray::Axis(0), 1).iter().copied().collect();
        let expected: Vec<f32> = (2..6).flat_map(|ep| vec![ep as f32; 5]).collect();
        assert_eq!(rewards, expected);
        assert_eq!(batch.states()[[0, 0, 0]], 200.0);
        assert_eq!(batch.states()[[0, 19, 1]], 504.0);
        assert_eq!(batch.next_states()[[1, 7, 0]], 302.5);
        assert_eq!(batch.actions()[[1, 10, 2]], 400.0);
    }

    #[test]
    fn test_slab_length_property() {
        for horizon in 1..6 {
            for k in 0..5 {
                let h = k * horizon;
                let mut buffer = SlabBuffer::new(h, horizon, 2, STATE_DIM, ACTION_DIM).unwrap();
                let lens = context_lens(&mut buffer, horizon, 12);
                for (e, len) in lens.iter().enumerate() {
                    assert_eq!(*len, e.min(h / horizon) * horizon);
                    if e > 0 {
                        // Eviction never drops more than one episode per step
                        assert!(*len + horizon >= lens[e - 1]);
                        assert!(*len >= lens[e - 1]);
                    }
                }
            }
        }
    }

    #[test]
    fn test_slab_rejects_non_divisible_context() {
        let err = SlabBuffer::new(7, 5, 2, STATE_DIM, ACTION_DIM).err().unwrap();
        assert_eq!(
            err.downcast_ref::<IcrlError>(),
            Some(&IcrlError::ContextNotDivisible {
                context_len: 7,
                horizon: 5
            })
        );
        let err = ContextPolicy::Slab.validate(7, 5).unwrap_err();
        assert!(err.downcast_ref::<IcrlError>().is_some());
        assert!(ContextPolicy::Fractional.validate(7, 5).is_ok());
    }

    #[test]
    fn test_zero_horizon_is_rejected() {
        for policy in [ContextPolicy::Slab, ContextPolicy::Fractional].iter() {
            let err = policy.validate(10, 0).unwrap_err();
            assert_eq!(
                err.downcast_ref::<IcrlError>(),
                Some(&IcrlError::InvalidHorizon)
            );
        }
    }

    #[test]
    fn test_fractional_example() {
        let mut buffer = FractionalBuffer::new(7, 5, 2, STATE_DIM, ACTION_DIM).unwrap();
        let lens = context_lens(&mut buffer, 5, 5);
        assert_eq!(lens, vec![0, 5, 7, 7, 7]);
    }

    #[test]
    fn test_fractional_keeps_latest_timesteps() {
        let mut buffer = FractionalBuffer::new(7, 5, 2, STATE_DIM, ACTION_DIM).unwrap();
        for ep in 0..3 {
            buffer.push(&rollout(2, 5, ep)).unwrap();
        }

        // The last 2 steps of episode 1 followed by episode 2
        let batch = buffer.context().unwrap();
        let states: Vec<f32> = (0..7).map(|t| batch.states()[[1, t, 0]]).collect();
        assert_eq!(states, vec![103.0, 104.0, 200.0, 201.0, 202.0, 203.0, 204.0]);
        let rewards: Vec<f32> = (0..7).map(|t| batch.rewards()[[0, t, 0]]).collect();
        assert_eq!(rewards, vec![1.0, 1.0, 2.0, 2.0, 2.0, 2.0, 2.0]);
    }

    #[test]
    fn test_fractional_length_property() {
        for horizon in 1..7 {
            for h in 0..20 {
                let mut buffer = FractionalBuffer::new(h, horizon, 2, STATE_DIM, ACTION_DIM).unwrap();
                let bound = (h + horizon - 1) / horizon + 1;
                for e in 0..15 {
                    let batch = buffer.context().unwrap();
                    assert_eq!(batch.len(), h.min(e * horizon));
                    assert!(buffer.n_episodes() <= bound);
                    buffer.push(&rollout(2, horizon, e)).unwrap();
                }
            }
        }
    }

    #[test]
    fn test_fractional_context_ends_with_latest_episode() {
        let mut buffer = FractionalBuffer::new(12, 5, 2, STATE_DIM, ACTION_DIM).unwrap();
        for ep in 0..9 {
            buffer.push(&rollout(2, 5, ep)).unwrap();
            let batch = buffer.context().unwrap();
            let last = batch.len() - 1;
            assert_eq!(batch.states()[[0, last, 0]], (100 * ep + 4) as f32);
        }
    }

    #[test]
    fn test_rollout_shape_is_checked() {
        let mut buffer = ContextPolicy::Fractional
            .build(10, 5, 2, STATE_DIM, ACTION_DIM)
            .unwrap();
        let err = buffer.push(&rollout(3, 5, 0)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<IcrlError>(),
            Some(IcrlError::ShapeMismatch(_))
        ));
        let err = buffer.push(&rollout(2, 4, 0)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<IcrlError>(),
            Some(IcrlError::ShapeMismatch(_))
        ));
        assert_eq!(buffer.total_steps(), 0);
    }

    #[test]
    fn test_zero_context_len() {
        for policy in [ContextPolicy::Slab, ContextPolicy::Fractional].iter() {
            let mut buffer = policy.build(0, 5, 2, STATE_DIM, ACTION_DIM).unwrap();
            let lens = context_lens(buffer.as_mut(), 5, 3);
            assert_eq!(lens, vec![0, 0, 0]);
        }
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("slab".parse::<ContextPolicy>().unwrap(), ContextPolicy::Slab);
        assert_eq!(
            "fractional".parse::<ContextPolicy>().unwrap(),
            ContextPolicy::Fractional
        );
        assert!("ring".parse::<ContextPolicy>().is_err());
    }
}
