//! Chain registry: owns the chains of one skeleton session, assigns ids,
//! enforces the non-overlap rule between chains, and orchestrates
//! ordered batch solving.

use std::collections::{HashMap, HashSet, VecDeque};

use log::warn;

use super::chain::{ChainId, IkChain};
use crate::config::{
    DEFAULT_CHAIN_SIZE, DEFAULT_SOLVER_ITERATIONS, MIN_CHAIN_SIZE, SOLVE_BUDGET_MS,
};
use crate::core::bone::BoneId;
use crate::core::skeleton::Skeleton;
use crate::utils::logging::{warn_if_frame_budget_exceeded, ScopedTimer};

/// Owns and tracks the set of IK chains active in one skeleton session.
///
/// The central invariant maintained here: a bone may be an internal
/// (non-tail) link of at most one tracked chain at any time, while it
/// may be the tail of arbitrarily many. All chain creation, resizing,
/// and removal go through this type; bypassing it is the only way to
/// reach an inconsistent state.
#[derive(Default)]
pub struct IkManager {
    chains: HashMap<ChainId, IkChain>,
    next_id: u32,
}

impl IkManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    pub fn chain(&self, id: ChainId) -> Option<&IkChain> {
        self.chains.get(&id)
    }

    /// Mutable access, used by callers to write target points before a
    /// solve. The bone list itself stays encapsulated.
    pub fn chain_mut(&mut self, id: ChainId) -> Option<&mut IkChain> {
        self.chains.get_mut(&id)
    }

    /// Tracked chain ids in ascending order.
    pub fn chain_ids(&self) -> Vec<ChainId> {
        let mut ids: Vec<ChainId> = self.chains.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Conflict rule: a bone is available for a new or growing chain to
    /// pass through if it has no side-data yet, or if every tracked
    /// chain referencing it uses it only as a tail.
    pub fn can_grow_from(&self, skeleton: &Skeleton, bone: BoneId) -> bool {
        let Some(data) = skeleton.ik_data(bone) else {
            return true;
        };

        data.chains
            .iter()
            .filter_map(|id| self.chains.get(id))
            .all(|chain| chain.tail() == bone)
    }

    /// Creates a new chain headed at `effector`, growing it as close to
    /// `size` links as the hierarchy and other chains allow. Returns
    /// `None` (with a logged warning) when the size is below the minimum
    /// or the effector is already claimed by another chain.
    pub fn create_chain_from_bone(
        &mut self,
        skeleton: &mut Skeleton,
        effector: BoneId,
        size: usize,
    ) -> Option<ChainId> {
        if size < MIN_CHAIN_SIZE {
            warn!("IK chains must have a minimum size of {MIN_CHAIN_SIZE}");
            return None;
        }

        if !self.can_grow_from(skeleton, effector) {
            warn!(
                "Cannot create IK chain: bone \"{}\" is already part of a chain",
                skeleton.bone_name(effector)
            );
            return None;
        }

        // Start with a minimal chain that is guaranteed conflict-free,
        // then grow it; growth stops where another chain is met.
        let id = ChainId(self.next_id);
        let chain = IkChain::new(id, skeleton, effector, DEFAULT_CHAIN_SIZE)?;
        self.next_id += 1;
        self.chains.insert(id, chain);

        self.set_chain_size(skeleton, id, size);

        Some(id)
    }

    /// Admits an externally constructed chain (e.g. rebuilt from a
    /// persisted descriptor). Rejected unless every non-tail link passes
    /// the conflict rule; a rejected chain is disposed so it leaves no
    /// stale side-data references behind.
    pub fn add_chain(&mut self, skeleton: &mut Skeleton, chain: IkChain) -> bool {
        if self.chains.contains_key(&chain.id()) {
            // The id already maps to a tracked chain; drop the incoming
            // one without leaving its registrations behind.
            chain.dispose(skeleton);
            return true;
        }

        let bones = chain.bones();
        for (index, &bone) in bones[..bones.len() - 1].iter().enumerate() {
            if !self.can_grow_from(skeleton, bone) {
                warn!("Cannot add chain: bone #{index} is used by another chain");
                chain.dispose(skeleton);
                return false;
            }
        }

        let id = chain.id();
        // Keep later ids from colliding with an admitted persisted one.
        self.next_id = self.next_id.max(id.0 + 1);
        self.chains.insert(id, chain);
        self.lock_chain_tails(skeleton);
        true
    }

    /// Removes one chain and strips it from every referenced bone.
    pub fn remove_chain(&mut self, skeleton: &mut Skeleton, id: ChainId) {
        if let Some(chain) = self.chains.remove(&id) {
            chain.dispose(skeleton);
        }
    }

    /// Disposes every tracked chain and resets id assignment. Ids are
    /// therefore unique only within one generation between resets.
    pub fn remove_all_chains(&mut self, skeleton: &mut Skeleton) {
        for (_, chain) in self.chains.drain() {
            chain.dispose(skeleton);
        }
        self.next_id = 0;
    }

    /// Resizes a tracked chain, clamping growth to the steps that both
    /// have a parent bone and pass the conflict rule. Returns whether
    /// the chain was modified. Tail locks are recomputed for every
    /// tracked chain afterwards, since claiming or freeing a bone can
    /// change which other chains may rotate their own tail.
    pub fn set_chain_size(&mut self, skeleton: &mut Skeleton, id: ChainId, size: usize) -> bool {
        let Some(chain) = self.chains.get(&id) else {
            warn!("Chain is not tracked by the manager, ignored");
            return false;
        };

        let mut size = size;
        if size > chain.size() {
            let requested_steps = size - chain.size();
            let mut achieved = 0;

            let mut current = chain.tail();
            let mut parent = skeleton.parent_of(current);
            while achieved < requested_steps
                && parent.is_some()
                && self.can_grow_from(skeleton, current)
            {
                achieved += 1;
                current = parent.unwrap_or(current);
                parent = skeleton.parent_of(current);
            }

            if achieved < requested_steps {
                warn!("Chain size cannot be increased to {size}: not enough bones available");
            }

            size = chain.size() + achieved;
        }

        let modified = match self.chains.get_mut(&id) {
            Some(chain) => chain.set_size(skeleton, size),
            None => false,
        };

        self.lock_chain_tails(skeleton);

        modified
    }

    /// Recomputes `lock_tail` for every tracked chain.
    ///
    /// A chain's tail is locked when another chain passes through that
    /// bone as a non-tail link (that chain owns the joint's rotation),
    /// and unconditionally when the tail is the skeleton root.
    pub fn lock_chain_tails(&mut self, skeleton: &Skeleton) {
        let tails: Vec<(ChainId, BoneId)> = self
            .chains
            .iter()
            .map(|(&id, chain)| (id, chain.tail()))
            .collect();

        for (id, tail) in tails {
            let mut lock = false;

            if let Some(data) = skeleton.ik_data(tail) {
                let sharing: Vec<&IkChain> = data
                    .chains
                    .iter()
                    .filter_map(|c| self.chains.get(c))
                    .collect();
                if sharing.len() > 1 && sharing.iter().any(|chain| chain.tail() != tail) {
                    lock = true;
                }
            }

            if skeleton.parent_of(tail).is_none() {
                lock = true;
            }

            if let Some(chain) = self.chains.get_mut(&id) {
                chain.lock_tail = lock;
            }
        }
    }

    /// Read-only probe for UI affordances: can `delta` more links be
    /// added to this chain right now?
    pub fn can_increase_chain(&self, skeleton: &Skeleton, id: ChainId, delta: usize) -> bool {
        let Some(chain) = self.chains.get(&id) else {
            return false;
        };

        let mut current = chain.tail();
        for _ in 0..delta {
            let parent = skeleton.parent_of(current);
            if parent.is_none() || !self.can_grow_from(skeleton, current) {
                return false;
            }
            current = parent.unwrap_or(current);
        }

        chain.can_increase(skeleton, delta)
    }

    pub fn can_decrease_chain(&self, id: ChainId, delta: usize) -> bool {
        self.chains
            .get(&id)
            .map(|chain| chain.can_decrease(delta))
            .unwrap_or(false)
    }

    /// Solves the given chains (all tracked chains when `subset` is
    /// `None`) in root-to-leaf order and returns how many chains were
    /// solved.
    ///
    /// For each unique skeleton root involved, the bone subtree is
    /// traversed breadth-first; the first time a bone's side-data names
    /// a chain, that chain is solved and marked done for the rest of the
    /// call. Solving ancestor chains before descendant chains guarantees
    /// a deeper chain always reads an already-finalized ancestor pose
    /// within the same pass.
    pub fn solve_chains(&self, skeleton: &mut Skeleton, subset: Option<&[ChainId]>) -> usize {
        let _timer = ScopedTimer::new("solve_chains");
        let started = std::time::Instant::now();

        let mut roots: Vec<BoneId> = Vec::new();
        match subset {
            Some(ids) => {
                for id in ids {
                    if let Some(chain) = self.chains.get(id) {
                        let root = skeleton.root_of(chain.tail());
                        if !roots.contains(&root) {
                            roots.push(root);
                        }
                    }
                }
            }
            None => {
                for chain in self.chains.values() {
                    let root = skeleton.root_of(chain.tail());
                    if !roots.contains(&root) {
                        roots.push(root);
                    }
                }
            }
        }

        let mut solved: HashSet<ChainId> = HashSet::new();

        for root in roots {
            let mut queue = VecDeque::from([root]);
            while let Some(bone) = queue.pop_front() {
                queue.extend(skeleton.children_of(bone).iter().copied());

                let Some(data) = skeleton.ik_data(bone) else {
                    continue;
                };
                let referenced: Vec<ChainId> = data.chains.clone();

                for id in referenced {
                    if solved.contains(&id) {
                        continue;
                    }
                    if let Some(chain) = self.chains.get(&id) {
                        solved.insert(id);
                        chain.solve(skeleton, DEFAULT_SOLVER_ITERATIONS);
                    }
                }
            }
        }

        warn_if_frame_budget_exceeded(started.elapsed(), SOLVE_BUDGET_MS);
        solved.len()
    }
}
