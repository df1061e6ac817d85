//! A toroidal grid that indexes agents by the cell they occupy.
//!
//! The index is a flat `Vec` of cells, one per coordinate pair, each holding
//! the ids of the agents currently located there. Order within a cell carries
//! no meaning, which lets removal swap the last id into the vacated slot.
//!
//! Every agent is in exactly one cell at a time. Callers are expected to keep
//! the index in step with the agents' stored coordinates; a removal that
//! does not find the agent is a logic error and trips a debug assertion.

use crate::population::AgentId;

/// Offsets of the 3×3 Moore neighborhood, centre included.
const NEIGHBORHOOD: [(isize, isize); 9] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 0),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

#[derive(Clone, Debug)]
pub struct GridIndex {
    size: usize,
    cells: Vec<Vec<AgentId>>,
    indexed: usize,
}

impl GridIndex {
    /// Creates an empty `size × size` grid.
    ///
    /// # Panics
    ///
    /// Panics if `size` is zero.
    #[must_use]
    pub fn new(size: usize) -> GridIndex {
        assert!(size > 0, "grid size must be positive");
        GridIndex {
            size,
            cells: vec![Vec::new(); size * size],
            indexed: 0,
        }
    }

    /// Side length of the grid.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    fn cell_index(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.size && y < self.size, "({x}, {y}) is off the grid");
        x * self.size + y
    }

    /// Wraps `coordinate + offset` onto `0..size`.
    #[inline]
    #[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
    fn wrap(&self, coordinate: usize, offset: isize) -> usize {
        (coordinate as isize + offset).rem_euclid(self.size as isize) as usize
    }

    pub fn insert(&mut self, agent: AgentId, x: usize, y: usize) {
        let index = self.cell_index(x, y);
        self.cells[index].push(agent);
        self.indexed += 1;
    }

    pub fn remove(&mut self, agent: AgentId, x: usize, y: usize) {
        let index = self.cell_index(x, y);
        let cell = &mut self.cells[index];
        if let Some(position) = cell.iter().position(|&id| id == agent) {
            cell.swap_remove(position);
            self.indexed -= 1;
        } else {
            debug_assert!(false, "agent {agent} is not indexed at ({x}, {y})");
        }
    }

    /// Relocates `agent` from `from` to `to`.
    pub fn move_agent(&mut self, agent: AgentId, from: (usize, usize), to: (usize, usize)) {
        self.remove(agent, from.0, from.1);
        self.insert(agent, to.0, to.1);
    }

    /// Number of agents in the 3×3 neighborhood centred on `(x, y)`,
    /// wrapping at the edges. On grids smaller than 3 the wrapped offsets
    /// land on the same cells more than once and each visit is counted.
    #[must_use]
    pub fn density_around(&self, x: usize, y: usize) -> usize {
        NEIGHBORHOOD
            .iter()
            .map(|&(dx, dy)| self.cell_len(self.wrap(x, dx), self.wrap(y, dy)))
            .sum()
    }

    #[must_use]
    pub fn cell_len(&self, x: usize, y: usize) -> usize {
        self.cells[self.cell_index(x, y)].len()
    }

    #[must_use]
    pub fn agents_at(&self, x: usize, y: usize) -> &[AgentId] {
        &self.cells[self.cell_index(x, y)]
    }

    #[must_use]
    pub fn contains(&self, agent: AgentId, x: usize, y: usize) -> bool {
        self.agents_at(x, y).contains(&agent)
    }

    /// Number of agents currently indexed.
    #[must_use]
    pub fn total_indexed(&self) -> usize {
        self.indexed
    }

    /// Recounts the agents cell by cell.
    #[must_use]
    pub fn count_cells(&self) -> usize {
        self.cells.iter().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::Xorshift64;

    #[test]
    fn insert_and_remove() {
        let mut grid = GridIndex::new(4);
        grid.insert(AgentId(0), 1, 2);
        grid.insert(AgentId(1), 1, 2);
        grid.insert(AgentId(2), 3, 3);
        assert_eq!(grid.cell_len(1, 2), 2);
        assert_eq!(grid.total_indexed(), 3);

        grid.remove(AgentId(0), 1, 2);
        assert_eq!(grid.agents_at(1, 2), &[AgentId(1)]);
        assert!(!grid.contains(AgentId(0), 1, 2));
        assert_eq!(grid.total_indexed(), 2);
        assert_eq!(grid.count_cells(), 2);
    }

    #[test]
    fn remove_swaps_last_into_place() {
        let mut grid = GridIndex::new(2);
        for id in 0..4 {
            grid.insert(AgentId(id), 0, 0);
        }
        grid.remove(AgentId(1), 0, 0);
        assert_eq!(grid.agents_at(0, 0), &[AgentId(0), AgentId(3), AgentId(2)]);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "is not indexed at")]
    fn removing_missing_agent_is_a_bug() {
        let mut grid = GridIndex::new(3);
        grid.insert(AgentId(0), 0, 0);
        grid.remove(AgentId(0), 1, 1);
    }

    #[test]
    fn move_agent_updates_both_cells() {
        let mut grid = GridIndex::new(5);
        grid.insert(AgentId(7), 0, 0);
        grid.move_agent(AgentId(7), (0, 0), (4, 2));
        assert_eq!(grid.cell_len(0, 0), 0);
        assert!(grid.contains(AgentId(7), 4, 2));
        assert_eq!(grid.total_indexed(), 1);

        // Moving to the same cell keeps the agent indexed once.
        grid.move_agent(AgentId(7), (4, 2), (4, 2));
        assert_eq!(grid.agents_at(4, 2), &[AgentId(7)]);
    }

    #[test]
    fn density_counts_moore_neighborhood() {
        let mut grid = GridIndex::new(10);
        grid.insert(AgentId(0), 5, 5);
        grid.insert(AgentId(1), 4, 4);
        grid.insert(AgentId(2), 6, 6);
        grid.insert(AgentId(3), 5, 7); // two columns away
        assert_eq!(grid.density_around(5, 5), 3);
        // (4, 4) drops out, (5, 7) comes in.
        assert_eq!(grid.density_around(5, 6), 3);
        assert_eq!(grid.density_around(4, 3), 1);
        assert_eq!(grid.density_around(0, 0), 0);
    }

    #[test]
    fn density_wraps_at_edges() {
        let mut grid = GridIndex::new(10);
        grid.insert(AgentId(0), 9, 9);
        grid.insert(AgentId(1), 0, 9);
        grid.insert(AgentId(2), 9, 0);
        grid.insert(AgentId(3), 1, 1);
        assert_eq!(grid.density_around(0, 0), 4);
        assert_eq!(grid.density_around(9, 9), 3);
    }

    #[test]
    fn density_on_tiny_grids_counts_aliased_cells() {
        // On a 1×1 grid all nine offsets are the single cell.
        let mut grid = GridIndex::new(1);
        grid.insert(AgentId(0), 0, 0);
        assert_eq!(grid.density_around(0, 0), 9);

        // On a 2×2 grid offsets -1 and +1 alias: each row/column is visited
        // either once (offset 0) or twice.
        let mut grid = GridIndex::new(2);
        grid.insert(AgentId(0), 0, 0);
        grid.insert(AgentId(1), 1, 1);
        assert_eq!(grid.density_around(0, 0), 1 + 4);
        assert_eq!(grid.density_around(0, 1), 2 + 2);
    }

    #[test]
    fn random_moves_keep_every_agent_indexed_once() {
        let size = 7;
        let n = 200;
        let mut rng = Xorshift64::new(12345);
        let mut grid = GridIndex::new(size);
        let mut positions = Vec::with_capacity(n);
        for id in 0..n {
            let position = (rng.sample_index(size), rng.sample_index(size));
            grid.insert(AgentId(id), position.0, position.1);
            positions.push(position);
        }

        for _ in 0..5_000 {
            let id = rng.sample_index(n);
            let to = (rng.sample_index(size), rng.sample_index(size));
            grid.move_agent(AgentId(id), positions[id], to);
            positions[id] = to;
        }

        assert_eq!(grid.total_indexed(), n);
        assert_eq!(grid.count_cells(), n);
        for (id, &(x, y)) in positions.iter().enumerate() {
            let occurrences: usize = (0..size)
                .flat_map(|cx| (0..size).map(move |cy| (cx, cy)))
                .map(|(cx, cy)| {
                    grid.agents_at(cx, cy)
                        .iter()
                        .filter(|&&agent| agent == AgentId(id))
                        .count()
                })
                .sum();
            assert_eq!(occurrences, 1);
            assert!(grid.contains(AgentId(id), x, y));
        }
    }
}
