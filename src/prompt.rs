//! Renders the instruction text sent alongside the two photos.
//!
//! The wording is content, but the slots are not: the model conditions on the
//! goal, the two-subject scene, the current photo as background and lighting
//! source, the text placement and the watermark.

use crate::constants::BRAND;

/// Builds the generation prompt for `name` with photos from `childhood_year`
/// and `current_year`. Image 1 is the childhood photo, image 2 the current one.
pub fn build_prompt(name: &str, childhood_year: &str, current_year: &str) -> String {
    format!(
        r#"**Primary Goal: Create a single, heart-touching, artistic photo with 100% accurate facial likeness and crystal-clear, high-resolution quality. This is the highest priority.**

**Scene Description:**
The photo shows two versions of the same person, '{name}', in a warm, nostalgic hug:
1. **Childhood version:** based on the first image (from {childhood_year}).
2. **Current version:** based on the second image (from {current_year}).
They look at each other with genuine affection, a moment of deep connection.

**Artistic Style:**
- **Background:** Faithfully recreate the background of the *second (current) image*. Keep its character, elements and mood, but make it more artistic, serene and beautiful. Apply a soft bokeh to distant parts of the background so the subjects stand out.
- **Lighting:** Replicate the lighting of the *second (current) image*. Enhance golden hour if present; keep daylight soft and flattering. The light on both subjects must match the background for a photorealistic result.
- **Atmosphere:** Only if it suits the background, add very subtle glowing particles floating in the air. Keep the effect understated and natural.

**Integrated Text:**
- **Position:** Integrate the name '{name}' into the **middle or upper-middle area of the background**. It is a key visual element but must not overpower the subjects.
- **Style:** Choose the font and style for the name to match the background's aesthetic (elegant for a garden, modern for a city, playful for a park). No generic fonts.
- **Years:** Directly below the name, in a similar but smaller style, show the years: "{childhood_year} - {current_year}".
- **Integration:** Blend the text with the scene's lighting using soft shadows or glows so it looks part of the environment, not an overlay.

**Watermark:**
- Place a small, discreet, elegant watermark with the word "{BRAND}" in the bottom right corner of the image.

**Final Output:**
One cohesive, crisp, high-resolution photograph combining both versions of the person with perfect facial likeness, set in the enhanced background described above."#
    )
}
