//! Spatial hash grid for neighbor search.
//!
//! Uses a sorted-index permutation plus a per-bucket start table rather than a
//! `HashMap`, so a rebuild is one hash pass, one sort and one linear scan.
//! Cells are hashed into a fixed-size table; distinct cells that alias to the
//! same bucket are merged. Results are therefore candidate sets: callers must
//! re-check distances.

/// Marker for a bucket with no particles in the current rebuild.
pub const EMPTY_BUCKET: u32 = u32::MAX;

const PRIME_X: i32 = 92_837_111;
const PRIME_Y: i32 = 689_287_499;
const PRIME_Z: i32 = 283_923_481;

/// Uniform-cell spatial hash.
///
/// Cell size should equal the kernel support radius (2h) so that for any
/// particle the 27 (3x3x3) surrounding cells contain every particle within
/// the support.
#[derive(Debug, Clone)]
pub struct SpatialHashGrid {
    cell_size: f32,
    inv_cell_size: f32,
    table_size: usize,
    /// Bucket index of each particle (parallel to particle arrays).
    hashes: Vec<u32>,
    /// Particle indices sorted by bucket.
    sorted_indices: Vec<u32>,
    /// First position in `sorted_indices` for each bucket, or `EMPTY_BUCKET`.
    bucket_start: Vec<u32>,
    /// Number of particles in each bucket.
    bucket_count: Vec<u32>,
}

impl SpatialHashGrid {
    /// Create an empty grid with `table_size` buckets.
    pub fn new(cell_size: f32, table_size: usize) -> Self {
        assert!(cell_size > 0.0, "cell_size must be positive");
        assert!(table_size > 0, "table_size must be at least 1");
        Self {
            cell_size,
            inv_cell_size: 1.0 / cell_size,
            table_size,
            hashes: Vec::new(),
            sorted_indices: Vec::new(),
            bucket_start: vec![EMPTY_BUCKET; table_size],
            bucket_count: vec![0; table_size],
        }
    }

    /// Edge length of one cell.
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Number of buckets in the hash table.
    pub fn table_size(&self) -> usize {
        self.table_size
    }

    /// Integer cell coordinates of a position: `floor(pos / cell_size)`.
    #[inline]
    pub fn cell_id(&self, pos: [f32; 3]) -> [i32; 3] {
        [
            (pos[0] * self.inv_cell_size).floor() as i32,
            (pos[1] * self.inv_cell_size).floor() as i32,
            (pos[2] * self.inv_cell_size).floor() as i32,
        ]
    }

    /// Bucket of a cell.
    #[inline]
    pub fn hash_cell(&self, cell: [i32; 3]) -> usize {
        let h = cell[0].wrapping_mul(PRIME_X)
            ^ cell[1].wrapping_mul(PRIME_Y)
            ^ cell[2].wrapping_mul(PRIME_Z);
        h.unsigned_abs() as usize % self.table_size
    }

    /// Bucket of the cell containing `pos`.
    #[inline]
    pub fn hash(&self, pos: [f32; 3]) -> usize {
        self.hash_cell(self.cell_id(pos))
    }

    /// Rebuild the table from current particle positions.
    ///
    /// Every bucket is reset first, so nothing from a previous rebuild can be
    /// observed by later queries. The three slices must have the same length.
    pub fn rebuild(&mut self, x: &[f32], y: &[f32], z: &[f32]) {
        let n = x.len();
        debug_assert_eq!(n, y.len());
        debug_assert_eq!(n, z.len());

        // --- 1. Bucket of each particle ---
        let mut hashes = std::mem::take(&mut self.hashes);
        hashes.clear();
        hashes.extend((0..n).map(|i| self.hash([x[i], y[i], z[i]]) as u32));
        self.hashes = hashes;

        // --- 2. Sort particle indices by bucket (stable) ---
        self.sorted_indices.clear();
        self.sorted_indices.extend(0..n as u32);
        let hashes = &self.hashes;
        self.sorted_indices.sort_by_key(|&i| hashes[i as usize]);

        // --- 3. Single scan recording where each bucket begins ---
        self.bucket_start.fill(EMPTY_BUCKET);
        self.bucket_count.fill(0);
        for (pos, &i) in self.sorted_indices.iter().enumerate() {
            let bucket = self.hashes[i as usize] as usize;
            if self.bucket_start[bucket] == EMPTY_BUCKET {
                self.bucket_start[bucket] = pos as u32;
            }
            self.bucket_count[bucket] += 1;
        }
    }

    /// Particles stored in `bucket`.
    #[inline]
    fn bucket(&self, bucket: usize) -> &[u32] {
        let start = self.bucket_start[bucket];
        if start == EMPTY_BUCKET {
            return &[];
        }
        let start = start as usize;
        &self.sorted_indices[start..start + self.bucket_count[bucket] as usize]
    }

    /// All particles sharing the bucket of `pos`.
    ///
    /// Includes particles of every cell aliasing to that bucket, not only the
    /// geometric cell containing `pos`.
    pub fn query_cell(&self, pos: [f32; 3]) -> &[u32] {
        self.bucket(self.hash(pos))
    }

    /// Invoke `f` once for every particle in the 27 cells around `pos`.
    ///
    /// An empty bucket skips only its own offset. Buckets reached from more than
    /// one offset (hash aliasing) are visited once, so no index is reported twice.
    pub fn for_each_neighborhood_candidate<F>(&self, pos: [f32; 3], mut f: F)
    where
        F: FnMut(usize),
    {
        let [cx, cy, cz] = self.cell_id(pos);
        let mut visited = [0usize; 27];
        let mut n_visited = 0;

        for dz in -1i32..=1 {
            for dy in -1i32..=1 {
                for dx in -1i32..=1 {
                    let cell = [
                        cx.wrapping_add(dx),
                        cy.wrapping_add(dy),
                        cz.wrapping_add(dz),
                    ];
                    let bucket = self.hash_cell(cell);
                    if visited[..n_visited].contains(&bucket) {
                        continue;
                    }
                    visited[n_visited] = bucket;
                    n_visited += 1;

                    let members = self.bucket(bucket);
                    if members.is_empty() {
                        continue;
                    }
                    for &j in members {
                        f(j as usize);
                    }
                }
            }
        }
    }

    /// Union of [`query_cell`](Self::query_cell) over the 27 cells around `pos`.
    pub fn query_neighborhood(&self, pos: [f32; 3]) -> Vec<u32> {
        let mut result = Vec::new();
        self.for_each_neighborhood_candidate(pos, |j| result.push(j as u32));
        result
    }
}

/// Source of pair candidates for the SPH passes.
#[derive(Debug, Clone, Copy)]
pub enum Candidates<'a> {
    /// 27-cell neighborhood from a freshly rebuilt grid.
    Grid(&'a SpatialHashGrid),
    /// Every particle index in `0..count`.
    AllPairs {
        /// Number of particles.
        count: usize,
    },
}

impl Candidates<'_> {
    /// Invoke `f` for each candidate near `pos`, possibly including the
    /// querying particle itself.
    #[inline]
    pub fn for_each<F>(&self, pos: [f32; 3], mut f: F)
    where
        F: FnMut(usize),
    {
        match self {
            Candidates::Grid(grid) => grid.for_each_neighborhood_candidate(pos, f),
            Candidates::AllPairs { count } => (0..*count).for_each(&mut f),
        }
    }
}
