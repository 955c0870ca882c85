use rand::prelude::*;

/// Default parameter initializer: a uniform sample in `[-1, 1)` drawn from the
/// thread-local RNG.
pub fn default_random() -> f64 {
    rand::thread_rng().gen::<f64>() * 2.0 - 1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samples_stay_in_range() {
        for _ in 0..1000 {
            let x = default_random();
            assert!((-1.0..1.0).contains(&x));
        }
    }
}
