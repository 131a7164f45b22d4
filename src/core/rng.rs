use rand::SeedableRng;

use super::sampling::ONE_MINUS_EPSILON;

/// Seeded generator; the same seed always gives the same stream.
#[derive(Clone)]
pub struct Rng {
    rng: rand::rngs::SmallRng,
}

impl Rng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: rand::rngs::SmallRng::seed_from_u64(seed),
        }
    }

    pub fn uniform_1d(&mut self) -> f32 {
        rand::Rng::gen::<f32>(&mut self.rng).min(ONE_MINUS_EPSILON)
    }

    pub fn uniform_2d(&mut self) -> glam::Vec2 {
        let x = self.uniform_1d();
        let y = self.uniform_1d();
        glam::Vec2::new(x, y)
    }

    /// Discards the next `n` draws.
    pub fn advance(&mut self, n: u32) {
        for _ in 0..n {
            rand::RngCore::next_u32(&mut self.rng);
        }
    }
}

impl std::fmt::Debug for Rng {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Rng { .. }")
    }
}

/// 64-bit finalizer, scrambles every input bit into every output bit.
pub fn mix_bits(mut v: u64) -> u64 {
    v ^= v >> 31;
    v = v.wrapping_mul(0x7fb5_d329_728e_a185);
    v ^= v >> 27;
    v = v.wrapping_mul(0x81da_def4_bc2d_d44d);
    v ^= v >> 33;
    v
}

/// Hash of a pixel coordinate and two extra keys.
pub fn hash_pixel(p: glam::IVec2, a: u64, b: u64) -> u64 {
    let xy = ((p.x as u32 as u64) << 32) | p.y as u32 as u64;
    mix_bits(xy ^ mix_bits(a.wrapping_add(0x9e37_79b9_7f4a_7c15) ^ mix_bits(b)))
}

/// The `i`-th element of a pseudo-random permutation of `0..l` selected by `p`.
///
/// Kensler's hashed permutation; cycle-walks until the hashed value falls below `l`.
pub fn permutation_element(mut i: u32, l: u32, p: u32) -> u32 {
    let mut w = l - 1;
    w |= w >> 1;
    w |= w >> 2;
    w |= w >> 4;
    w |= w >> 8;
    w |= w >> 16;
    loop {
        i ^= p;
        i = i.wrapping_mul(0xe170_893d);
        i ^= p >> 16;
        i ^= (i & w) >> 4;
        i ^= p >> 8;
        i = i.wrapping_mul(0x0929_eb3f);
        i ^= p >> 23;
        i ^= (i & w) >> 1;
        i = i.wrapping_mul(1 | p >> 27);
        i = i.wrapping_mul(0x6935_fa69);
        i ^= (i & w) >> 11;
        i = i.wrapping_mul(0x74dc_b303);
        i ^= (i & w) >> 2;
        i = i.wrapping_mul(0x9e50_1cc3);
        i ^= (i & w) >> 2;
        i = i.wrapping_mul(0xc860_a3df);
        i &= w;
        i ^= i >> 5;
        if i < l {
            break;
        }
    }
    ((i as u64 + p as u64) % l as u64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_stream() {
        let mut a = Rng::new(42);
        let mut b = Rng::new(42);
        for _ in 0..32 {
            assert_eq!(a.uniform_1d(), b.uniform_1d());
        }
        a.advance(3);
        for _ in 0..3 {
            b.uniform_1d();
        }
        assert_eq!(a.uniform_2d(), b.uniform_2d());
    }

    #[test]
    fn permutation_is_bijective() {
        for &l in &[1, 2, 5, 16, 33] {
            for &seed in &[0, 7, 0xdead_beef] {
                let mut seen = vec![false; l as usize];
                for i in 0..l {
                    let e = permutation_element(i, l, seed);
                    assert!(e < l);
                    assert!(!seen[e as usize]);
                    seen[e as usize] = true;
                }
            }
        }
    }

    #[test]
    fn pixel_hash_separates_inputs() {
        let p = glam::IVec2::new(3, 4);
        assert_ne!(hash_pixel(p, 0, 0), hash_pixel(glam::IVec2::new(4, 3), 0, 0));
        assert_ne!(hash_pixel(p, 0, 0), hash_pixel(p, 1, 0));
        assert_ne!(hash_pixel(p, 0, 0), hash_pixel(p, 0, 1));
        assert_eq!(hash_pixel(p, 5, 6), hash_pixel(p, 5, 6));
    }
}
