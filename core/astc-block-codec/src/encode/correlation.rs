//! Channel correlation estimate for the dual-plane early-out.

use libm::sqrt;

/// Returns `|corr(alpha, luma)|` for a block's RGBA8 texels, where luma is
/// the plain sum r+g+b. Blocks with no variance report full correlation.
pub(crate) fn alpha_luma_abs_correlation(texels: &[u8]) -> f64 {
    let n = texels.len() / 4;
    if n <= 1 {
        return 1.0;
    }

    let mut sum_l = 0i64;
    let mut sum_a = 0i64;
    let mut sum_ll = 0i64;
    let mut sum_aa = 0i64;
    let mut sum_la = 0i64;

    for texel in texels.chunks_exact(4) {
        let l = i64::from(texel[0]) + i64::from(texel[1]) + i64::from(texel[2]);
        let a = i64::from(texel[3]);
        sum_l += l;
        sum_a += a;
        sum_ll += l * l;
        sum_aa += a * a;
        sum_la += l * a;
    }

    let nn = n as i64;
    let var_l = sum_ll * nn - sum_l * sum_l;
    let var_a = sum_aa * nn - sum_a * sum_a;
    if var_l <= 0 || var_a <= 0 {
        return 1.0;
    }

    let cov = sum_la * nn - sum_l * sum_a;
    let corr = cov as f64 / sqrt(var_l as f64 * var_a as f64);
    corr.abs().min(1.0)
}
