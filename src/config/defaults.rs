// src/config/defaults.rs

//! The built-in pipeline used when no `Sitepipe.toml` is present.
//!
//! Order of the startup run:
//! clean-dist → clean-img → compile-styles → concat-styles →
//! compress-scripts → optimize-images → convert-avif → convert-webp →
//! convert-fonts → assemble-pages → minify-html.
//!
//! `concat-styles` and `minify-html` read build output, which may be absent
//! when an earlier task wrote nothing.
//!
//! `clean-img` wipes the whole `src/img/source` staging tree; the optimize
//! and convert tasks regenerate its subdirectories.

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

pub const DEFAULT_PIPELINE: &str = r#"
[config]
triggered_while_running_behaviour = "queue"
queue_length = 1

[serve]
dir = "dist"
port = 3000

[task.clean-dist]
description = "Remove the previous build output"
stage = "clean"
src = ["dist"]
steps = [{ kind = "clean" }]

[task.clean-img]
description = "Remove the image staging directories"
stage = "clean"
src = ["src/img/source"]
steps = [{ kind = "clean" }]
after = ["clean-dist"]

[task.compile-styles]
description = "Concatenate and compile SCSS into compressed CSS"
stage = "compile"
src = ["src/scss/**/*.scss"]
dest = "dist/css"
newer = true
on_error = "log"
reload = true
after = ["clean-img"]
steps = [
  { kind = "concat", file = "style.min.css" },
  { kind = "command", cmd = "sass --stdin --no-source-map --style=compressed --load-path=src/scss < {input} > {output}" },
]

[task.concat-styles]
description = "Merge every stylesheet in dist/css"
stage = "compile"
src = ["dist/css/*.css"]
dest = "dist/css"
allow_empty = true
after = ["compile-styles"]
steps = [{ kind = "concat", file = "style.min.css" }]

[task.compress-scripts]
description = "Bundle and minify scripts"
stage = "compile"
src = ["src/js/*.js"]
dest = "dist/js"
newer = true
reload = true
after = ["concat-styles"]
steps = [
  { kind = "concat", file = "main.min.js" },
  { kind = "command", cmd = "terser {input} --compress --mangle --output {output}" },
]

[task.optimize-images]
description = "Losslessly optimize raster images"
stage = "optimize"
src = ["src/img/*.{jpg,png,gif}"]
dest = "src/img/source/optimize"
newer = true
on_error = "log"
allow_empty = true
after = ["compress-scripts"]
steps = [
  { kind = "command", only = ["*.gif"], cmd = "gifsicle --interlace {input} -o {output}" },
  { kind = "command", only = ["*.jpg"], cmd = "cjpeg -quality 80 -progressive -outfile {output} {input}" },
  { kind = "command", only = ["*.png"], cmd = "optipng -quiet -o2 -out {output} {input}" },
]

[task.convert-avif]
description = "Encode optimized images as AVIF"
stage = "convert"
src = ["src/img/source/optimize/*.{jpg,png}"]
dest = "src/img/source/avif"
allow_empty = true
after = ["optimize-images"]
steps = [{ kind = "command", ext = "avif", cmd = "avifenc -q 50 {input} {output}" }]

[task.convert-webp]
description = "Encode optimized images as WebP"
stage = "convert"
src = ["src/img/source/optimize/*.{jpg,png}"]
dest = "src/img/source/webp"
newer = true
allow_empty = true
after = ["convert-avif"]
steps = [{ kind = "command", ext = "webp", cmd = "cwebp -quiet {input} -o {output}" }]

[task.convert-fonts]
description = "Produce woff and woff2 web fonts"
stage = "convert"
src = ["src/fonts/*.*"]
dest = "dist/fonts"
newer = true
allow_empty = true
after = ["convert-webp"]
steps = [
  { kind = "command", only = ["*.ttf", "*.otf"], ext = "woff", keep_input = true, cmd = 'pyftsubset {input} --glyphs="*" --unicodes="*" --flavor=woff --output-file={output}' },
  { kind = "command", only = ["*.ttf"], ext = "woff2", keep_input = true, cmd = 'pyftsubset {input} --glyphs="*" --unicodes="*" --flavor=woff2 --output-file={output}' },
]

[task.assemble-pages]
description = "Inline components into pages"
stage = "assemble"
src = ["src/pages/*.html"]
dest = "dist"
reload = true
after = ["convert-fonts"]
steps = [{ kind = "include", paths = ["src/components"] }]

[task.minify-html]
description = "Collapse whitespace in assembled pages"
stage = "minify"
src = ["dist/*.html"]
dest = "dist"
allow_empty = true
reload = true
after = ["assemble-pages"]
steps = [{ kind = "command", cmd = "html-minifier-terser --collapse-whitespace --output {output} {input}" }]

[task.copy-images]
description = "Publish ready-made images"
src = ["src/img/dist/*.*"]
dest = "dist/img"
startup = false
allow_empty = true
after = ["clean-dist"]

[[watch]]
patterns = ["src/scss/**/*.scss"]
tasks = ["compile-styles", "concat-styles"]

[[watch]]
patterns = ["src/js/*.js"]
tasks = ["compress-scripts"]

[[watch]]
patterns = ["src/img/*.{jpg,png,gif}"]
tasks = ["optimize-images"]

[[watch]]
patterns = ["src/img/*.{jpg,png}"]
tasks = ["convert-webp", "convert-avif"]

[[watch]]
patterns = ["src/img/dist/*.*"]
tasks = ["copy-images"]

[[watch]]
patterns = ["src/fonts/*.*"]
tasks = ["convert-fonts"]

[[watch]]
patterns = ["src/pages/*", "src/components/*"]
tasks = ["assemble-pages"]
"#;

/// Parse and validate the built-in pipeline.
pub fn default_config() -> Result<ConfigFile> {
    let raw: RawConfigFile = toml::from_str(DEFAULT_PIPELINE)?;
    ConfigFile::try_from(raw)
}
