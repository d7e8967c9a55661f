//! Largest-remainder apportionment over the three splits.
//!
//! All arithmetic is integer: an ideal share is `size * part / scale`, its
//! remainder is `size * part % scale`. Ties go train, validation, test.

use std::cmp::Reverse;

type Cells = [usize; 3];

fn scale_of(parts: [u32; 3]) -> u64 {
    parts.iter().map(|p| u64::from(*p)).sum()
}

/// Floors and remainders of the ideal shares of `size`.
fn ideal(size: usize, parts: [u32; 3]) -> (Cells, [u64; 3]) {
    let scale = scale_of(parts);
    let mut floors = [0usize; 3];
    let mut rems = [0u64; 3];
    for j in 0..3 {
        let exact = size as u64 * u64::from(parts[j]);
        floors[j] = (exact / scale) as usize;
        rems[j] = exact % scale;
    }
    (floors, rems)
}

/// Split `total` by `parts`: floor every ideal share, then hand the leftover
/// units to the largest remainders.
pub(crate) fn largest_remainder(total: usize, parts: [u32; 3]) -> Cells {
    let (mut counts, rems) = ideal(total, parts);
    let leftover = total - counts.iter().sum::<usize>();

    let mut order = [0usize, 1, 2];
    order.sort_by_key(|&j| (Reverse(rems[j]), j));
    for &j in order.iter().take(leftover) {
        counts[j] += 1;
    }
    counts
}

/// Per-class split counts for a stratified split.
///
/// Split totals are fixed by [`largest_remainder`] on the whole dataset; each
/// row then sums to its class size and each column to its split total. Every
/// cell is the floor or floor + 1 of its ideal share, so no class strays more
/// than one sample from its proportion in any split.
///
/// Leftover units go, per class, to cells that would otherwise be empty first,
/// then to the largest remainders, then in split order, among the choices that
/// keep the remaining classes satisfiable.
pub(crate) fn stratified_counts(class_sizes: &[usize], parts: [u32; 3]) -> Vec<Cells> {
    let total: usize = class_sizes.iter().sum();
    let totals = largest_remainder(total, parts);

    let mut cells = Vec::with_capacity(class_sizes.len());
    let mut rems = Vec::with_capacity(class_sizes.len());
    let mut leftovers = Vec::with_capacity(class_sizes.len());
    for &size in class_sizes {
        let (floors, r) = ideal(size, parts);
        leftovers.push(size - floors.iter().sum::<usize>());
        cells.push(floors);
        rems.push(r);
    }

    // units each split still needs; never negative since totals >= sum of floors
    let mut demand = [0usize; 3];
    for j in 0..3 {
        demand[j] = totals[j] - cells.iter().map(|c| c[j]).sum::<usize>();
    }

    for i in 0..cells.len() {
        let mut ranked = [0usize, 1, 2];
        ranked.sort_by_key(|&j| (Reverse(cells[i][j] == 0), Reverse(rems[i][j]), j));

        let rest = &leftovers[i + 1..];
        let mut chosen = None;
        let mut fallback = None;
        for subset in subsets(ranked, leftovers[i]) {
            if subset.iter().any(|&j| demand[j] == 0) {
                continue;
            }
            let mut after = demand;
            for &j in &subset {
                after[j] -= 1;
            }
            fallback.get_or_insert(subset.clone());
            if satisfiable(after, rest) {
                chosen = Some(subset);
                break;
            }
        }
        // a satisfiable choice always exists; the fallback only keeps row sums exact
        let subset = chosen
            .or(fallback)
            .unwrap_or_else(|| ranked[..leftovers[i]].to_vec());
        for j in subset {
            cells[i][j] += 1;
            demand[j] = demand[j].saturating_sub(1);
        }
    }
    cells
}

/// Subsets of `ranked` with `size` members, most preferred first.
fn subsets(ranked: [usize; 3], size: usize) -> Vec<Vec<usize>> {
    (0u8..8)
        .filter(|mask| mask.count_ones() as usize == size)
        .map(|mask| (0..3usize).filter(|&b| mask & (1u8 << b) != 0).map(|b| ranked[b]).collect())
        .collect()
}

/// Gale–Ryser check: can rows with `leftovers` units (at most one per split
/// each) exactly fill `demand`?
fn satisfiable(mut demand: [usize; 3], leftovers: &[usize]) -> bool {
    if demand.iter().sum::<usize>() != leftovers.iter().sum::<usize>() {
        return false;
    }
    demand.sort_unstable_by(|a, b| b.cmp(a));
    let mut top = 0;
    for m in 1..=3 {
        top += demand[m - 1];
        let capacity: usize = leftovers.iter().map(|&r| r.min(m)).sum();
        if top > capacity {
            return false;
        }
    }
    true
}
