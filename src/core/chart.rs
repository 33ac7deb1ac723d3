/// Label spacing for a series of `len` points: roughly one label per year on
/// long horizons, about six on medium ones, every point on short ones.
pub fn tick_step(len: usize) -> usize {
    if len > 24 {
        len / 12
    } else if len > 6 {
        len / 6
    } else {
        1
    }
}

pub fn tick_positions(len: usize) -> Vec<usize> {
    (0..len).step_by(tick_step(len)).collect()
}
