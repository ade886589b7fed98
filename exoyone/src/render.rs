//! Plain text output for the `get` and `effects` commands.

use std::cmp::max;

use exoyone_lib::catalog::ModePack;
use exoyone_lib::state::{ExoyOneState, FriendlyView};
use exoyone_lib::util::color::{hsb_to_hex, hsb_to_rgb};

pub fn on_off(value: bool) -> &'static str {
    if value {
        "ON"
    } else {
        "OFF"
    }
}

/// Prints each section as a two column table.
pub fn print_friendly_view(view: &FriendlyView) {
    for section in &view.sections {
        let label_width = section
            .fields
            .iter()
            .map(|field| field.label.len())
            .fold(section.title.len(), max);
        let value_width = section
            .fields
            .iter()
            .map(|field| field.value.chars().count())
            .fold("Value".len(), max);

        println!(
            "{:<label_width$} {:<value_width$}",
            section.title,
            "Value",
            label_width = label_width + 2,
            value_width = value_width + 2,
        );
        println!("{}", "-".repeat(label_width + value_width + 5));
        for field in &section.fields {
            println!(
                "{:<label_width$} {:<value_width$}",
                field.label,
                field.value,
                label_width = label_width + 2,
                value_width = value_width + 2,
            );
        }
        println!();
    }
}

pub fn print_color(state: &ExoyOneState) {
    let (red, green, blue) = hsb_to_rgb(state.hue, state.saturation, state.brightness);
    println!(
        "HSB: {}, {}, {}",
        state.hue, state.saturation, state.brightness
    );
    println!("RGB: {}, {}, {}", red, green, blue);
    println!(
        "Hex: {}",
        hsb_to_hex(state.hue, state.saturation, state.brightness)
    );
}

pub fn print_pack(pack: &ModePack) {
    println!("{}", pack.name);
    let last = pack.effects.len().saturating_sub(1);
    for (index, effect) in pack.effects.iter().enumerate() {
        let branch = if index == last { "└──" } else { "├──" };
        println!("{} {}", branch, effect);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_on_off() {
        assert_eq!(on_off(true), "ON");
        assert_eq!(on_off(false), "OFF");
    }
}
