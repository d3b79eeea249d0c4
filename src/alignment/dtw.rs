//! Dynamic time warping between chroma sequences
//!
//! Classic full-matrix DTW with Euclidean frame distance and a
//! diagonal-preferring backtrack. Degenerate inputs (either sequence empty)
//! yield an empty path with infinite distance rather than an error.

/// Euclidean distance between two chroma frames
fn frame_distance(a: &[f64; 12], b: &[f64; 12]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

/// Monotone minimum-cost alignment path and its total cost
#[derive(Debug, Clone, PartialEq)]
pub struct DtwResult {
    /// Aligned index pairs (symbolic, acoustic), start to end
    pub path: Vec<(usize, usize)>,
    /// Accumulated cost at the end of the path
    pub distance: f64,
}

/// Compute the DTW alignment between two chroma sequences
pub fn dtw(symbolic: &[[f64; 12]], acoustic: &[[f64; 12]]) -> DtwResult {
    let n = symbolic.len();
    let m = acoustic.len();
    if n == 0 || m == 0 {
        return DtwResult { path: Vec::new(), distance: f64::INFINITY };
    }

    let mut cost = vec![vec![f64::INFINITY; m + 1]; n + 1];
    cost[0][0] = 0.0;
    for i in 1..=n {
        for j in 1..=m {
            let d = frame_distance(&symbolic[i - 1], &acoustic[j - 1]);
            let best = cost[i - 1][j].min(cost[i][j - 1]).min(cost[i - 1][j - 1]);
            cost[i][j] = d + best;
        }
    }

    // Backtrack preferring the diagonal, else the cheaper of left and up
    let mut path = Vec::with_capacity(n.max(m));
    let (mut i, mut j) = (n, m);
    while i > 0 && j > 0 {
        path.push((i - 1, j - 1));
        if i == 1 && j == 1 {
            break;
        }
        if i > 1 && j > 1 && cost[i - 1][j - 1] <= cost[i - 1][j] && cost[i - 1][j - 1] <= cost[i][j - 1]
        {
            i -= 1;
            j -= 1;
        } else if i > 1 && (j == 1 || cost[i - 1][j] <= cost[i][j - 1]) {
            i -= 1;
        } else {
            j -= 1;
        }
    }
    path.reverse();

    DtwResult { path, distance: cost[n][m] }
}

/// Alignment confidence from the normalised path cost, clipped to [0, 1]
pub fn path_confidence(distance: f64, n: usize, m: usize) -> f64 {
    if n == 0 || m == 0 || !distance.is_finite() {
        return 0.0;
    }
    (1.0 - distance / (n as f64 * m as f64)).clamp(0.0, 1.0)
}
