//! Tap-to-erase: clear a connected region of similar color.

use crate::raster::RasterBuffer;

/// Flood-fill from `(start_x, start_y)` and make every reached pixel fully
/// transparent. Returns the number of pixels cleared.
///
/// The seed's RGB is the fill target. A 4-connected neighbor joins the fill
/// when `|dR| + |dG| + |dB| <= tolerance` against the seed and its alpha is
/// still non-zero. Uses an explicit stack and one visited flag per pixel, so
/// the worst case is `O(width * height)` with no recursion.
///
/// Out-of-bounds seeds and already-transparent seeds are no-ops.
pub fn erase_region(buffer: &mut RasterBuffer, start_x: u32, start_y: u32, tolerance: u32) -> usize {
    let Some(seed) = buffer.pixel(start_x, start_y) else {
        return 0;
    };
    if seed[3] == 0 {
        return 0;
    }

    let width = buffer.width() as usize;
    let height = buffer.height() as usize;
    let data = buffer.as_raw_mut();

    let matches = |data: &[u8], idx: usize| -> bool {
        let o = idx * 4;
        if data[o + 3] == 0 {
            return false;
        }
        let diff = u32::from(data[o].abs_diff(seed[0]))
            + u32::from(data[o + 1].abs_diff(seed[1]))
            + u32::from(data[o + 2].abs_diff(seed[2]));
        diff <= tolerance
    };

    let mut visited = vec![false; width * height];
    let start = start_y as usize * width + start_x as usize;
    let mut stack = vec![start];
    visited[start] = true;
    let mut erased = 0;

    while let Some(idx) = stack.pop() {
        data[idx * 4 + 3] = 0;
        erased += 1;

        let (x, y) = (idx % width, idx / width);
        let neighbors = [
            (x > 0).then(|| idx - 1),
            (x + 1 < width).then(|| idx + 1),
            (y > 0).then(|| idx - width),
            (y + 1 < height).then(|| idx + width),
        ];
        for n in neighbors.into_iter().flatten() {
            if !visited[n] && matches(data, n) {
                visited[n] = true;
                stack.push(n);
            }
        }
    }

    erased
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(width: u32, height: u32) -> RasterBuffer {
        let mut img = RasterBuffer::filled(width, height, [200, 30, 30, 255]);
        for y in 0..height {
            for x in width / 2..width {
                img.set_pixel(x, y, [30, 30, 200, 255]);
            }
        }
        img
    }

    #[test]
    fn erases_exactly_the_seeded_region() {
        let mut img = split(10, 6);
        let erased = erase_region(&mut img, 1, 1, 0);
        assert_eq!(erased, 30);
        for y in 0..6 {
            for x in 0..10 {
                let expected = if x < 5 { 0 } else { 255 };
                assert_eq!(img.alpha(x, y), Some(expected), "pixel ({x},{y})");
            }
        }
    }

    #[test]
    fn transparent_seed_is_a_noop() {
        let mut img = split(8, 8);
        img.set_pixel(2, 2, [200, 30, 30, 0]);
        let before = img.clone();
        assert_eq!(erase_region(&mut img, 2, 2, 500), 0);
        assert_eq!(img, before);
    }

    #[test]
    fn out_of_bounds_seed_is_a_noop() {
        let mut img = split(8, 8);
        let before = img.clone();
        assert_eq!(erase_region(&mut img, 8, 0, 60), 0);
        assert_eq!(erase_region(&mut img, 0, 100, 60), 0);
        assert_eq!(img, before);
    }

    #[test]
    fn tolerance_swallows_texture() {
        let mut img = RasterBuffer::filled(6, 6, [100, 100, 100, 255]);
        // checkerboard noise, 20 per channel off the seed
        for y in 0..6 {
            for x in 0..6 {
                if (x + y) % 2 == 1 {
                    img.set_pixel(x, y, [120, 120, 120, 255]);
                }
            }
        }
        assert_eq!(erase_region(&mut img, 0, 0, 60), 36);

        let mut strict = RasterBuffer::filled(6, 6, [100, 100, 100, 255]);
        strict.set_pixel(1, 0, [120, 120, 120, 255]);
        strict.set_pixel(0, 1, [120, 120, 120, 255]);
        assert_eq!(erase_region(&mut strict, 0, 0, 59), 1, "corner is walled off");
    }

    #[test]
    fn does_not_cross_transparent_gaps() {
        let mut img = RasterBuffer::filled(7, 1, [0, 0, 0, 255]);
        img.set_pixel(3, 0, [0, 0, 0, 0]);
        assert_eq!(erase_region(&mut img, 0, 0, 0), 3);
        assert_eq!(img.alpha(4, 0), Some(255));
    }

    #[test]
    fn handles_large_regions_without_recursion() {
        let mut img = RasterBuffer::filled(1500, 1500, [255, 255, 255, 255]);
        assert_eq!(erase_region(&mut img, 750, 750, 0), 1500 * 1500);
        assert!(img.pixels().all(|px| px[3] == 0));
    }
}
