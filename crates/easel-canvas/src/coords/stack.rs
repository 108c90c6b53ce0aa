use thiserror::Error;

use super::{Affine2, Vec2};

/// Default bound on saved matrices.
pub const MAX_MATRIX_STACK_DEPTH: usize = 1 << 10;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Error)]
pub enum TransformStackError {
    #[error("matrix stack overflow (max depth {max})")]
    Overflow { max: usize },
    #[error("matrix stack underflow")]
    Underflow,
}

/// Bounded stack of saved matrices plus the current matrix.
///
/// A failed push or pop leaves both the stack and the current matrix as they
/// were.
#[derive(Debug, Clone)]
pub struct TransformStack {
    current: Affine2,
    saved: Vec<Affine2>,
    max_depth: usize,
}

impl Default for TransformStack {
    fn default() -> Self {
        Self::new(MAX_MATRIX_STACK_DEPTH)
    }
}

impl TransformStack {
    pub fn new(max_depth: usize) -> Self {
        Self {
            current: Affine2::IDENTITY,
            saved: Vec::with_capacity(max_depth.min(64)),
            max_depth,
        }
    }

    #[inline]
    pub fn current(&self) -> &Affine2 {
        &self.current
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.saved.len()
    }

    #[inline]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn push(&mut self) -> Result<(), TransformStackError> {
        if self.saved.len() >= self.max_depth {
            return Err(TransformStackError::Overflow {
                max: self.max_depth,
            });
        }
        self.saved.push(self.current);
        Ok(())
    }

    pub fn pop(&mut self) -> Result<(), TransformStackError> {
        let top = self.saved.pop().ok_or(TransformStackError::Underflow)?;
        self.current = top;
        Ok(())
    }

    pub fn translate(&mut self, x: f32, y: f32) {
        self.current.translate(x, y);
    }

    pub fn rotate(&mut self, radians: f32) {
        self.current.rotate(radians);
    }

    pub fn scale(&mut self, x: f32, y: f32) {
        self.current.scale(x, y);
    }

    pub fn load_identity(&mut self) {
        self.current = Affine2::IDENTITY;
    }

    pub fn load(&mut self, m: Affine2) {
        self.current = m;
    }

    #[inline]
    pub fn transform_point(&self, x: f32, y: f32) -> Vec2 {
        self.current.transform_point(x, y)
    }

    /// Drops all saved matrices and resets the current one.
    pub fn clear(&mut self) {
        self.saved.clear();
        self.current = Affine2::IDENTITY;
    }
}
