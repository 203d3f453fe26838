//! MIDI device plumbing on top of midir.

pub mod input;
pub mod output;

/// Pick the port for `wanted`: an exact name match wins, otherwise the first
/// port whose name contains it.
pub fn find_port<S: AsRef<str>>(names: &[S], wanted: &str) -> Option<usize> {
    names
        .iter()
        .position(|n| n.as_ref() == wanted)
        .or_else(|| names.iter().position(|n| n.as_ref().contains(wanted)))
}

#[cfg(test)]
mod tests {
    use super::find_port;

    #[test]
    fn exact_match_beats_earlier_substring_match() {
        let names = ["Keystation 49 MIDI 1", "Keystation 49", "Other"];
        assert_eq!(find_port(&names, "Keystation 49"), Some(1));
    }

    #[test]
    fn falls_back_to_substring() {
        let names = ["Midi Through:Midi Through Port-0 14:0", "nanoKEY2:nanoKEY2 MIDI 1 20:0"];
        assert_eq!(find_port(&names, "nanoKEY2"), Some(1));
        assert_eq!(find_port(&names, "Launchpad"), None);
        assert_eq!(find_port::<&str>(&[], "x"), None);
    }
}
