pub mod json_loader;

pub use json_loader::{
    load_batch, load_courses, load_prompts, prompt_file_for_slug, prompt_path_for_batch,
    prompt_path_for_course, read_markup,
};
