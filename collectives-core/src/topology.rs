//! Tree shapes shared by every collective: rank rotation around an arbitrary
//! root, the binary tree's parent/child arithmetic, and the binomial tree's
//! mask-doubling rounds.
//!
//! Every collective operates on a *relative* rank rather than the caller's
//! absolute one, so that "rank 0" always means "the root" regardless of
//! which absolute rank actually started the collective. [`rel_rank`] and
//! [`abs_rank`] are exact inverses of one another.

/// Rotates an absolute rank into the root's frame: `rel_rank(root, root, n) == 0`.
pub fn rel_rank(me: usize, root: usize, n: usize) -> usize {
    (me + n - root % n) % n
}

/// The inverse of [`rel_rank`]: recovers the absolute rank a relative rank
/// came from, for the same `root` and `n`.
pub fn abs_rank(rel: usize, root: usize, n: usize) -> usize {
    (rel + root) % n
}

/// `floor(log2(n))` for `n >= 1`, i.e. the number of doubling rounds a
/// binomial tree over `n` ranks needs.
pub fn floor_log2(n: usize) -> u32 {
    assert!(n >= 1, "floor_log2 is undefined for n == 0");
    usize::BITS - 1 - n.leading_zeros()
}

/// `true` if `n` is a power of two.
pub fn is_power_of_two(n: usize) -> bool {
    n != 0 && (n & (n - 1)) == 0
}

/// Splits `n` into `(p, extra)` where `p` is the largest power of two `<= n`
/// and `extra = n - p`.
///
/// This is how the binomial variants cover a non-power-of-two rank count
/// (§1's requirement that every primitive "must work correctly for arbitrary
/// participant counts, including non-powers-of-two"): the `extra` highest-
/// numbered ranks fold into their low-numbered partners (`rel - p`) before
/// the standard power-of-two binomial exchange runs over `[0, p)`, and fan
/// back out to those same partners afterward for the fan-out operations.
/// When `n` is already a power of two, `extra == 0` and this degenerates to
/// the plain binomial tree.
pub fn pow2_split(n: usize) -> (usize, usize) {
    assert!(n >= 1, "pow2_split is undefined for n == 0");
    let p = 1usize << floor_log2(n);
    (p, n - p)
}

/// A node's position in the complete binary tree over relative ranks
/// `0..n`, root at relative rank 0.
pub struct BinaryNode {
    pub rel: usize,
}

/// Which of a binary node's two mailbox slots a child corresponds to.
/// Mirrors the `(flag_odd, flag_even, payload_odd, payload_even)` mailbox
/// shape reduce-binary uses to tell its two children's arrivals apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Odd,
    Even,
}

impl BinaryNode {
    pub fn new(rel: usize) -> Self {
        BinaryNode { rel }
    }

    /// The parent's relative rank, or `None` at the root.
    pub fn parent(&self) -> Option<usize> {
        if self.rel == 0 {
            None
        } else {
            Some((self.rel - 1) / 2)
        }
    }

    /// This node's left (odd-slot) child, if it exists under `n` ranks.
    pub fn left(&self, n: usize) -> Option<usize> {
        let left = 2 * self.rel + 1;
        (left < n).then_some(left)
    }

    /// This node's right (even-slot) child, if it exists under `n` ranks.
    pub fn right(&self, n: usize) -> Option<usize> {
        let right = 2 * self.rel + 2;
        (right < n).then_some(right)
    }

    /// Both children, if present.
    pub fn children(&self, n: usize) -> (Option<usize>, Option<usize>) {
        (self.left(n), self.right(n))
    }

    /// Which mailbox slot a given child relative rank occupies in its
    /// parent's record. `child` must be `self.left(n)` or `self.right(n)`.
    pub fn slot_of_child(&self, child: usize) -> Slot {
        if child == 2 * self.rel + 1 {
            Slot::Odd
        } else {
            debug_assert_eq!(child, 2 * self.rel + 2);
            Slot::Even
        }
    }
}

/// One relative rank's role during one round of a binomial tree exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Nothing to do this round.
    Idle,
    /// Send to `to` this round.
    Send { to: usize },
    /// Receive from `from` this round.
    Receive { from: usize },
}

/// Binomial fan-out rounds (broadcast, scatter): the root starts as the only
/// sender, and every rank that has received becomes a sender in all
/// subsequent rounds too — a node's sender status never retires.
///
/// Exact for a power-of-two `n`; callers covering an arbitrary rank count
/// run this over `n = p` from [`pow2_split`] and handle the `extra` ranks
/// as a separate fold step (see the broadcast/scatter binomial modules).
pub fn fanout_role(rel: usize, round: u32, n: usize) -> Role {
    let mask = 1usize << round;
    if rel < mask {
        let to = rel + mask;
        if to < n {
            Role::Send { to }
        } else {
            Role::Idle
        }
    } else if rel < 2 * mask {
        Role::Receive { from: rel - mask }
    } else {
        Role::Idle
    }
}

/// The number of fan-out rounds needed to cover `n` ranks.
pub fn fanout_rounds(n: usize) -> u32 {
    floor_log2(n)
}

/// Binomial fan-in rounds (gather, reduce): a rank sends exactly once, to
/// its partner at the round matching its lowest set bit, then leaves the
/// tree permanently. A rank with no set bits below the round count (rank 0)
/// never sends; it only ever receives, ending with everyone's contribution.
///
/// Yields exactly [`fanout_rounds`] items for every `rel`, including rounds
/// after a rank has retired (as [`Role::Idle`]), rather than stopping the
/// iterator early. A caller that synchronizes every round with a barrier
/// (reduce-binomial) needs every participant to cross the same number of
/// rounds; an early-terminating iterator would leave a retired sender's
/// barrier count short of its still-active peers'.
pub struct FanIn {
    rel: usize,
    n: usize,
    round: u32,
    rounds: u32,
    retired: bool,
}

impl FanIn {
    pub fn new(rel: usize, n: usize) -> Self {
        FanIn { rel, n, round: 0, rounds: fanout_rounds(n), retired: false }
    }
}

impl Iterator for FanIn {
    type Item = Role;

    fn next(&mut self) -> Option<Role> {
        if self.round >= self.rounds {
            return None;
        }
        let mask = 1usize << self.round;
        self.round += 1;

        if self.retired {
            return Some(Role::Idle);
        }

        if self.rel & mask != 0 {
            // First round whose mask matches a set bit: send, then retire.
            self.retired = true;
            Some(Role::Send { to: self.rel - mask })
        } else if self.rel + mask < self.n {
            Some(Role::Receive { from: self.rel + mask })
        } else {
            Some(Role::Idle)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rel_rank_and_abs_rank_are_inverses() {
        for n in 1..=9 {
            for root in 0..n {
                for me in 0..n {
                    let rel = rel_rank(me, root, n);
                    assert_eq!(abs_rank(rel, root, n), me);
                }
            }
        }
    }

    #[test]
    fn rel_rank_maps_root_to_zero() {
        for n in 1..=9 {
            for root in 0..n {
                assert_eq!(rel_rank(root, root, n), 0);
            }
        }
    }

    #[test]
    fn pow2_split_recombines_to_n() {
        for n in 1..=20 {
            let (p, extra) = pow2_split(n);
            assert!(is_power_of_two(p));
            assert_eq!(p + extra, n);
            assert!(p <= n);
        }
    }

    #[test]
    fn fanin_yields_exactly_rounds_items_for_every_rank() {
        for n in [1, 2, 4, 8, 16] {
            let rounds = fanout_rounds(n);
            for rel in 0..n {
                let roles: Vec<Role> = FanIn::new(rel, n).collect();
                assert_eq!(roles.len(), rounds as usize);
            }
        }
    }

    #[test]
    fn fanin_sends_exactly_once_then_stays_idle() {
        // Rank 3 (0b011) over n=8 sends once, at the round matching its
        // lowest set bit, then every later round is idle rather than a
        // second send to a different partner.
        let roles: Vec<Role> = FanIn::new(3, 8).collect();
        let sends = roles.iter().filter(|r| matches!(r, Role::Send { .. })).count();
        assert_eq!(sends, 1);
        assert_eq!(roles[0], Role::Send { to: 2 });
        assert_eq!(roles[1], Role::Idle);
        assert_eq!(roles[2], Role::Idle);
    }

    #[test]
    fn fanin_rank_zero_only_ever_receives() {
        let roles: Vec<Role> = FanIn::new(0, 8).collect();
        assert!(roles.iter().all(|r| matches!(r, Role::Receive { .. })));
    }

    #[test]
    fn binary_node_children_respect_rank_count() {
        let node = BinaryNode::new(0);
        assert_eq!(node.children(1), (None, None));
        assert_eq!(node.children(3), (Some(1), Some(2)));
        assert_eq!(node.left(2), Some(1));
        assert_eq!(node.right(2), None);
    }
}
