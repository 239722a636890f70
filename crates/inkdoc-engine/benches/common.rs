// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
// See: https://users.rust-lang.org/t/cargo-rustc-benches-awarnings/110111/2
#[allow(dead_code)]
pub fn generate_plaintext_note(paragraphs: usize) -> String {
    let base = "Meeting notes for the week\nAgenda items follow {draft}\n\n";
    base.repeat(paragraphs)
}

#[allow(dead_code)]
pub fn generate_markup_note(paragraphs: usize, image_every: usize) -> String {
    let mut content = String::new();

    for i in 0..paragraphs {
        content.push_str(&format!(
            "<Paragraph><Run>Paragraph {i} with &amp; entities and {{}}{{braces}}</Run>\
             <LineBreak /><Run>second line</Run></Paragraph>"
        ));
        if image_every > 0 && i % image_every == 0 {
            content.push_str("<Paragraph Tag=\"base64\">iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8/5+hHgAHggJ/PchI7wAAAABJRU5ErkJggg==</Paragraph>");
        }
    }

    content
}
