use image::{DynamicImage, GrayImage};
use image_hasher::{HashAlg, HasherConfig, ImageHash};

/// Perceptual hash of an OCR crop, used to tell whether the text region
/// changed since the last recognition.
pub fn compute_phash(image: &GrayImage) -> ImageHash {
    let hasher = HasherConfig::new()
        .hash_alg(HashAlg::DoubleGradient)
        .hash_size(8, 8)
        .to_hasher();

    hasher.hash_image(&DynamicImage::ImageLuma8(image.clone()))
}

pub fn compute_hamming_distance(lhs: &ImageHash, rhs: &ImageHash) -> u32 {
    lhs.dist(rhs)
}
