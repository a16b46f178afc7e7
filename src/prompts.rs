use crate::models::StyleParams;

pub fn style_report_prompt(params: &StyleParams) -> String {
    let mut optional = Vec::new();
    if let Some(weight) = params.weight_kg {
        optional.push(format!("Weight: {weight}kg"));
    }
    if let Some(vibe) = params.style_vibe {
        optional.push(format!("Preferred style vibe: {}", vibe.as_str()));
    }
    if let Some(fit) = params.fit_preference {
        optional.push(format!("Fit preference: {}", fit.as_str()));
    }
    let optional_text = if optional.is_empty() {
        "No additional preferences provided.".to_string()
    } else {
        optional.join("\n")
    };

    format!(
        r#"You are a professional personal stylist. Analyze the person in this photo and provide practical, positive fashion advice.

Context:
- Height: {height}cm
- Occasion: {occasion}
{optional_text}

Generate a comprehensive style report in JSON format with these sections:

1. summary: 3-4 key style insights (bullet points)
2. body_fit:
   - overall: 1-2 sentence body type overview (neutral, positive tone)
   - do: 3-4 clothing recommendations that work well
   - avoid: 2-3 styles to skip (phrased constructively)
3. colors:
   - best: 4-6 colors that complement their features
   - avoid: 2-3 colors that don't work as well
   - notes: Brief explanation of color choices
4. outfits: 3 complete outfit suggestions, each with:
   - title: Outfit name
   - items: {{top, bottom, shoes, outerwear}}
   - why: Why this outfit works
5. styling_tips: 4-5 quick practical tips for the occasion
6. hairstyles: exactly 9 hairstyle recommendations, each with:
   - name: Hairstyle name
   - why: Why it suits them
   - how: Brief styling instructions

Important guidelines:
- Use simple, practical language
- Be positive and constructive (no judging language)
- Avoid sensitive identity claims
- Tailor advice to the occasion
- Consider optional preferences if provided
- If photo quality is unclear, provide best-effort guidance

Return ONLY valid JSON matching this exact schema."#,
        height = params.height_cm,
        occasion = params.occasion.as_str(),
    )
}

/// Asks the image model for one 3x3 collage, panels in row-major order.
pub fn hair_collage_prompt(hairstyles: &[String]) -> String {
    let panel_list = if hairstyles.is_empty() {
        "Show variety: short, medium, long, curly, straight, textured styles.".to_string()
    } else {
        let lines: Vec<String> = hairstyles
            .iter()
            .enumerate()
            .map(|(i, name)| format!("{}: {}", i + 1, name))
            .collect();
        format!(
            "Apply these styles left to right, top to bottom:\n{}",
            lines.join("\n")
        )
    };

    format!(
        r#"Using the uploaded photo as the identity reference, create a single image showing a 3x3 grid (9 cells) of hairstyle variations.

Requirements:
- All 9 hairstyles should be visible in ONE square image
- Arrange in a clear 3x3 grid layout, evenly sized cells
- Same person, framing, lighting and neutral background in every cell; only the hair changes
- Each cell should clearly show the hairstyle from the front
- Professional styling reference photo quality

{panel_list}

Make it look like a professional hairstyle reference board that someone could screenshot and show to their barber or stylist."#
    )
}
