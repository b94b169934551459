#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Stylistic transforms the AI can apply.
pub enum Effect {
    Cartoonize,
    Posterize,
}

impl Effect {
    pub const ALL: [Effect; 2] = [Effect::Cartoonize, Effect::Posterize];

    /// Lower-case name used in status text.
    pub fn name(self) -> &'static str {
        match self {
            Effect::Cartoonize => "cartoonize",
            Effect::Posterize => "posterize",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Effect::Cartoonize => "Cartoonize",
            Effect::Posterize => "Posterize",
        }
    }

    /// Instruction sent to the model alongside the image.
    pub fn instruction(self) -> &'static str {
        match self {
            Effect::Cartoonize => {
                "Cartoonize this image. Make the lines bold and the colors vibrant, like a classic animated comic."
            }
            Effect::Posterize => {
                "Posterize this image. Reduce the number of colors to create a bold, graphic, poster-like effect with sharp contrasts."
            }
        }
    }

    pub fn loading_message(self) -> String {
        format!("Applying {} effect...", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::Effect;

    #[test]
    fn loading_message_uses_lower_case_name() {
        assert_eq!(
            Effect::Cartoonize.loading_message(),
            "Applying cartoonize effect..."
        );
        assert_eq!(
            Effect::Posterize.loading_message(),
            "Applying posterize effect..."
        );
    }

    #[test]
    fn each_effect_has_its_own_instruction() {
        assert!(Effect::Cartoonize.instruction().starts_with("Cartoonize"));
        assert!(Effect::Posterize.instruction().starts_with("Posterize"));
    }
}
