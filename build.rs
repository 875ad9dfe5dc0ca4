use std::process::Command;

fn main() {
    // Only rebuild CSS when template or CSS files change
    println!("cargo:rerun-if-changed=assets/css/input.css");
    println!("cargo:rerun-if-changed=templates/");
    println!("cargo:rerun-if-changed=tailwind.config.js");

    let status = Command::new("tailwindcss")
        .args([
            "-c",
            "tailwind.config.js",
            "-i",
            "assets/css/input.css",
            "-o",
            "assets/css/output.css",
            "--minify",
        ])
        .status();

    match status {
        Ok(s) if s.success() => {
            println!("cargo:warning=Tailwind CSS compiled successfully");
        }
        _ => {
            println!("cargo:warning=Tailwind CLI not found, using fallback CSS");
            std::fs::create_dir_all("assets/css").ok();
            std::fs::write("assets/css/output.css", FALLBACK_CSS).ok();
        }
    }
}

/// Hand-written subset of the utility classes the templates use.
const FALLBACK_CSS: &str = r#"*, *::before, *::after { box-sizing: border-box; margin: 0; padding: 0; }
body { font-family: system-ui, -apple-system, sans-serif; line-height: 1.6; color: #1c1917; background: #fafaf9; -webkit-font-smoothing: antialiased; }
.min-h-screen { min-height: 100vh; }
.mx-auto { margin-left: auto; margin-right: auto; }
.max-w-4xl { max-width: 56rem; }
.max-w-md { max-width: 28rem; }
.px-4 { padding-left: 1rem; padding-right: 1rem; }
.py-3 { padding-top: 0.75rem; padding-bottom: 0.75rem; }
.py-6 { padding-top: 1.5rem; padding-bottom: 1.5rem; }
.py-8 { padding-top: 2rem; padding-bottom: 2rem; }
.py-16 { padding-top: 4rem; padding-bottom: 4rem; }
.mb-2 { margin-bottom: 0.5rem; }
.mb-4 { margin-bottom: 1rem; }
.mb-8 { margin-bottom: 2rem; }
.ml-auto { margin-left: auto; }
.mt-1 { margin-top: 0.25rem; }
.flex { display: flex; }
.inline-flex { display: inline-flex; }
.items-center { align-items: center; }
.justify-between { justify-content: space-between; }
.gap-3 { gap: 0.75rem; }
.gap-4 { gap: 1rem; }
.text-center { text-align: center; }
.text-xs { font-size: 0.75rem; }
.text-sm { font-size: 0.875rem; }
.text-lg { font-size: 1.125rem; }
.text-xl { font-size: 1.25rem; }
.text-4xl { font-size: 2.25rem; }
.font-semibold { font-weight: 600; }
.font-bold { font-weight: 700; }
.text-stone-500 { color: #78716c; }
.text-stone-600 { color: #57534e; }
.text-stone-900 { color: #1c1917; }
.bg-white { background-color: #fff; }
.bg-stone-50 { background-color: #fafaf9; }
.border-b { border-bottom: 1px solid; }
.border-t { border-top: 1px solid; }
.border-stone-200 { border-color: #e7e5e4; }
.whitespace-pre-wrap { white-space: pre-wrap; }
a { color: inherit; text-decoration: none; }
a:hover { opacity: 0.8; }
ul { list-style: none; }
.btn { display: inline-flex; align-items: center; justify-content: center; padding: 0.5rem 1rem; border-radius: 0.5rem; font-size: 0.875rem; font-weight: 500; cursor: pointer; }
.btn-primary { background: #1c1917; color: #fff; border: none; }
.btn-primary:hover { background: #44403c; }
.btn-secondary { background: #fff; color: #1c1917; border: 1px solid #d6d3d1; }
.btn-secondary:hover { background: #f5f5f4; }
.card { background: #fff; border-radius: 0.75rem; border: 1px solid #e7e5e4; padding: 1.5rem; box-shadow: 0 1px 2px 0 rgb(0 0 0 / 0.05); }
.nav-link { font-size: 0.875rem; color: #57534e; }
.nav-link.active, .category-link.active { color: #1c1917; font-weight: 600; }
.category-link { display: block; padding: 0.25rem 0; font-size: 0.875rem; color: #57534e; }
.alert { border-radius: 0.5rem; padding: 0.75rem 1rem; font-size: 0.875rem; }
.alert-error { background: #fef2f2; color: #991b1b; border: 1px solid #fecaca; }
.alert-success { background: #f0fdf4; color: #166534; border: 1px solid #bbf7d0; }
.form label { display: flex; flex-direction: column; gap: 0.25rem; margin-bottom: 1rem; font-size: 0.875rem; font-weight: 500; }
.form input, .form textarea, .form select { border: 1px solid #d6d3d1; border-radius: 0.5rem; padding: 0.5rem 0.75rem; font: inherit; }
.data-table { width: 100%; font-size: 0.875rem; border-collapse: collapse; }
.data-table th { text-align: left; font-weight: 600; border-bottom: 1px solid #e7e5e4; padding: 0.5rem 0; }
.data-table td { border-bottom: 1px solid #f5f5f4; padding: 0.5rem 0; }
.feature-image { width: 100%; border-radius: 0.5rem; }
.blog-layout { display: grid; gap: 2rem; }
@media (min-width: 768px) { .blog-layout { grid-template-columns: 1fr 14rem; } }
html.dark body { background: #1c1917; color: #f5f5f4; }
html.dark .card, html.dark nav { background: #292524; border-color: #44403c; }
"#;
