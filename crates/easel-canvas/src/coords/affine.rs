use super::Vec2;

/// 2D affine transform stored as the 2×3 matrix
///
/// ```text
/// | a  c  tx |
/// | b  d  ty |
/// | 0  0  1  |
/// ```
///
/// Every operation post-multiplies, so the most recently applied operation
/// acts on local space first: `translate` then `rotate` rotates inside the
/// already-translated frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Affine2 {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub tx: f32,
    pub ty: f32,
}

impl Default for Affine2 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Affine2 {
    pub const IDENTITY: Affine2 = Affine2 {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        tx: 0.0,
        ty: 0.0,
    };

    #[inline]
    pub const fn identity() -> Self {
        Self::IDENTITY
    }

    /// Builds a matrix from `[a, b, c, d, tx, ty]`.
    #[inline]
    pub const fn load(m: [f32; 6]) -> Self {
        Self {
            a: m[0],
            b: m[1],
            c: m[2],
            d: m[3],
            tx: m[4],
            ty: m[5],
        }
    }

    #[inline]
    pub const fn as_array(&self) -> [f32; 6] {
        [self.a, self.b, self.c, self.d, self.tx, self.ty]
    }

    pub fn translate(&mut self, x: f32, y: f32) {
        self.tx += self.a * x + self.c * y;
        self.ty += self.b * x + self.d * y;
    }

    pub fn rotate(&mut self, radians: f32) {
        let (sr, cr) = radians.sin_cos();
        let Affine2 { a, b, c, d, .. } = *self;
        self.a = cr * a + sr * c;
        self.b = cr * b + sr * d;
        self.c = -sr * a + cr * c;
        self.d = -sr * b + cr * d;
    }

    pub fn scale(&mut self, x: f32, y: f32) {
        self.a *= x;
        self.b *= x;
        self.c *= y;
        self.d *= y;
    }

    /// Returns `self × rhs`: `rhs` is applied to points first.
    pub fn then(&self, rhs: &Affine2) -> Affine2 {
        Affine2 {
            a: self.a * rhs.a + self.c * rhs.b,
            b: self.b * rhs.a + self.d * rhs.b,
            c: self.a * rhs.c + self.c * rhs.d,
            d: self.b * rhs.c + self.d * rhs.d,
            tx: self.a * rhs.tx + self.c * rhs.ty + self.tx,
            ty: self.b * rhs.tx + self.d * rhs.ty + self.ty,
        }
    }

    #[inline]
    pub fn determinant(&self) -> f32 {
        self.a * self.d - self.b * self.c
    }

    /// Inverse transform, or `None` for a singular matrix.
    pub fn inverse(&self) -> Option<Affine2> {
        let det = self.determinant();
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let inv = 1.0 / det;
        let a = self.d * inv;
        let b = -self.b * inv;
        let c = -self.c * inv;
        let d = self.a * inv;
        Some(Affine2 {
            a,
            b,
            c,
            d,
            tx: -(a * self.tx + c * self.ty),
            ty: -(b * self.tx + d * self.ty),
        })
    }

    #[inline]
    pub fn transform_point(&self, x: f32, y: f32) -> Vec2 {
        Vec2::new(
            x * self.a + y * self.c + self.tx,
            x * self.b + y * self.d + self.ty,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    const EPS: f32 = 1e-4;

    fn approx(p: Vec2, x: f32, y: f32) -> bool {
        (p.x - x).abs() < EPS && (p.y - y).abs() < EPS
    }

    /// Plain 3×3 multiply used as the reference for composition tests.
    fn mat3(m: &Affine2) -> [[f32; 3]; 3] {
        [[m.a, m.c, m.tx], [m.b, m.d, m.ty], [0.0, 0.0, 1.0]]
    }

    fn mul3(l: [[f32; 3]; 3], r: [[f32; 3]; 3]) -> [[f32; 3]; 3] {
        let mut out = [[0.0; 3]; 3];
        for (i, row) in out.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                *cell = (0..3).map(|k| l[i][k] * r[k][j]).sum();
            }
        }
        out
    }

    fn apply3(m: [[f32; 3]; 3], x: f32, y: f32) -> (f32, f32) {
        (
            m[0][0] * x + m[0][1] * y + m[0][2],
            m[1][0] * x + m[1][1] * y + m[1][2],
        )
    }

    // ── basic ops ────────────────────────────────────────────────────────

    #[test]
    fn identity_leaves_points() {
        let m = Affine2::identity();
        assert!(approx(m.transform_point(3.0, -7.5), 3.0, -7.5));
    }

    #[test]
    fn translate_moves_points() {
        let mut m = Affine2::identity();
        m.translate(10.0, 20.0);
        assert!(approx(m.transform_point(1.0, 2.0), 11.0, 22.0));
    }

    #[test]
    fn rotate_quarter_turn() {
        let mut m = Affine2::identity();
        m.rotate(FRAC_PI_2);
        assert!(approx(m.transform_point(1.0, 0.0), 0.0, 1.0));
        assert!(approx(m.transform_point(0.0, 1.0), -1.0, 0.0));
    }

    #[test]
    fn scale_then_translate_scales_offset() {
        let mut m = Affine2::identity();
        m.scale(2.0, 3.0);
        m.translate(5.0, 5.0);
        assert!(approx(m.transform_point(0.0, 0.0), 10.0, 15.0));
    }

    #[test]
    fn translate_then_rotate_rotates_in_translated_frame() {
        let mut m = Affine2::identity();
        m.translate(100.0, 0.0);
        m.rotate(PI);
        assert!(approx(m.transform_point(10.0, 0.0), 90.0, 0.0));
    }

    #[test]
    fn load_round_trips_components() {
        let raw = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        assert_eq!(Affine2::load(raw).as_array(), raw);
    }

    // ── composition ──────────────────────────────────────────────────────

    #[test]
    fn op_sequence_matches_matrix_algebra() {
        let mut m = Affine2::identity();
        m.translate(12.0, -4.0);
        m.rotate(0.7);
        m.scale(1.5, 0.5);
        m.translate(-3.0, 8.0);
        m.rotate(-1.9);

        let (s7, c7) = 0.7f32.sin_cos();
        let (s19, c19) = (-1.9f32).sin_cos();
        let t1 = [[1.0, 0.0, 12.0], [0.0, 1.0, -4.0], [0.0, 0.0, 1.0]];
        let r1 = [[c7, -s7, 0.0], [s7, c7, 0.0], [0.0, 0.0, 1.0]];
        let s1 = [[1.5, 0.0, 0.0], [0.0, 0.5, 0.0], [0.0, 0.0, 1.0]];
        let t2 = [[1.0, 0.0, -3.0], [0.0, 1.0, 8.0], [0.0, 0.0, 1.0]];
        let r2 = [[c19, -s19, 0.0], [s19, c19, 0.0], [0.0, 0.0, 1.0]];
        let reference = mul3(mul3(mul3(mul3(t1, r1), s1), t2), r2);

        for &(x, y) in &[(0.0, 0.0), (1.0, 0.0), (-5.0, 9.0), (33.0, -0.25)] {
            let (ex, ey) = apply3(reference, x, y);
            assert!(approx(m.transform_point(x, y), ex, ey), "point ({x}, {y})");
        }
    }

    #[test]
    fn then_matches_reference_multiply() {
        let mut l = Affine2::identity();
        l.translate(3.0, 4.0);
        l.rotate(0.3);
        let mut r = Affine2::identity();
        r.scale(2.0, -1.0);
        r.translate(1.0, 1.0);

        let got = mat3(&l.then(&r));
        let want = mul3(mat3(&l), mat3(&r));
        for i in 0..2 {
            for j in 0..3 {
                assert!((got[i][j] - want[i][j]).abs() < EPS);
            }
        }
    }

    #[test]
    fn inverse_undoes_transform() {
        let mut m = Affine2::identity();
        m.translate(40.0, -2.0);
        m.rotate(1.1);
        m.scale(0.5, 4.0);
        let inv = m.inverse().expect("invertible");
        let p = m.transform_point(7.0, 3.0);
        assert!(approx(inv.transform_point(p.x, p.y), 7.0, 3.0));
    }

    #[test]
    fn zero_scale_has_no_inverse() {
        let mut m = Affine2::identity();
        m.scale(0.0, 1.0);
        assert!(m.inverse().is_none());
    }
}
