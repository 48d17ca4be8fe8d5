//! Subset and permutation enumeration for the finders

/// Every `k`-element subset of `items`, in lexicographic index order
pub fn combinations<T: Clone>(items: &[T], k: usize) -> Vec<Vec<T>> {
    let n = items.len();
    if k > n {
        return Vec::new();
    }

    let mut result = Vec::with_capacity(binomial(n, k));
    let mut indices: Vec<usize> = (0..k).collect();
    loop {
        result.push(indices.iter().map(|&i| items[i].clone()).collect());

        // Rightmost index that can still move right
        let Some(pos) = (0..k).rev().find(|&i| indices[i] < n - k + i) else {
            return result;
        };
        indices[pos] += 1;
        for i in pos + 1..k {
            indices[i] = indices[i - 1] + 1;
        }
    }
}

/// Every ordering of `items` (Heap's algorithm)
pub fn permutations<T: Clone>(items: &[T]) -> Vec<Vec<T>> {
    let mut current = items.to_vec();
    let n = current.len();
    let mut result = Vec::with_capacity((1..=n).product());
    result.push(current.clone());

    let mut counters = vec![0usize; n];
    let mut i = 1;
    while i < n {
        if counters[i] < i {
            if i % 2 == 0 {
                current.swap(0, i);
            } else {
                current.swap(counters[i], i);
            }
            result.push(current.clone());
            counters[i] += 1;
            i = 1;
        } else {
            counters[i] = 0;
            i += 1;
        }
    }
    result
}

/// `n choose k`
pub fn binomial(n: usize, k: usize) -> usize {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    (0..k).fold(1, |acc, i| acc * (n - i) / (i + 1))
}
