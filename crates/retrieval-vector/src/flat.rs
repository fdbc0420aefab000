use std::io::{Read, Write};

use retrieval_core::error::{Error, Result};
use retrieval_core::traits::VectorIndexer;
use retrieval_core::types::VectorHit;

use crate::codec;

/// Row-major flat store; row `i` is the vector added `i`-th.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatIndex {
    dim: Option<usize>,
    rows: usize,
    data: Vec<f32>,
}

impl FlatIndex {
    pub fn new() -> Self { Self::default() }

    pub(crate) fn from_parts(dim: Option<usize>, rows: usize, data: Vec<f32>) -> Self {
        Self { dim, rows, data }
    }

    pub fn as_slice(&self) -> &[f32] { &self.data }

    pub fn row(&self, position: usize) -> Option<&[f32]> {
        let dim = self.dim?;
        if position >= self.rows { return None; }
        Some(&self.data[position * dim..(position + 1) * dim])
    }
}

impl VectorIndexer for FlatIndex {
    fn dim(&self) -> Option<usize> { self.dim }

    fn len(&self) -> usize { self.rows }

    fn add(&mut self, vectors: Vec<Vec<f32>>) -> Result<()> {
        let Some(first) = vectors.first() else { return Ok(()) };
        let dim = self.dim.unwrap_or(first.len());
        if let Some(bad) = vectors.iter().find(|v| v.len() != dim) {
            return Err(Error::DimensionMismatch { expected: dim, actual: bad.len() });
        }
        self.dim = Some(dim);
        self.data.reserve(vectors.len() * dim);
        for v in &vectors { self.data.extend_from_slice(v); }
        self.rows += vectors.len();
        Ok(())
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<VectorHit>> {
        let dim = match self.dim {
            Some(dim) if self.rows > 0 => dim,
            _ => return Err(Error::EmptyIndex),
        };
        if query.len() != dim {
            return Err(Error::DimensionMismatch { expected: dim, actual: query.len() });
        }
        let mut hits: Vec<VectorHit> = (0..self.rows)
            .filter_map(|position| Some(VectorHit { position, distance: squared_l2(query, self.row(position)?) }))
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance).then(a.position.cmp(&b.position)));
        hits.truncate(k);
        Ok(hits)
    }

    fn write_to(&self, writer: &mut dyn Write) -> Result<()> { codec::write_index(self, writer) }

    fn read_from(reader: &mut dyn Read) -> Result<Self> { codec::read_index(reader) }
}

pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}
