use rand::Rng;

/// Picks up to `cap` members uniformly without replacement.
///
/// All members are returned when there are no more than `cap`. The result
/// is sorted so output order depends only on which members were drawn.
pub fn sample_members<R: Rng + ?Sized>(members: &[usize], cap: usize, rng: &mut R) -> Vec<usize> {
    if members.len() <= cap {
        return members.to_vec();
    }
    let mut picked: Vec<usize> = rand::seq::index::sample(rng, members.len(), cap)
        .into_iter()
        .map(|i| members[i])
        .collect();
    picked.sort_unstable();
    picked
}
