#[cfg(test)]
pub const POST_DOCUMENT: &str = r#"# Post metadata
title: "Ten things I learned shipping Rust"
category: Programming
tags: "rust, lessons, tooling"   # comma separated
featured_image: 3
status: publish
author: ignored

# --- Content ---
# Intro
[paragraph]
Rust has been my main language for a while.
Read the [book](https://doc.rust-lang.org/book/) first.
[/paragraph]

[heading level=2]
What worked
[/heading]

[list type=ordered]
1. Small crates
2. Typed errors
[/list]

[quote]
Make it work, make it right, make it fast.
[/quote]

[code]
cargo new hello
[/code]

[embed]
https://www.youtube.com/watch?v=abc123
[/embed]
"#;

#[cfg(test)]
pub const POST_DOCUMENT_HTML: &str = r#"<p>Rust has been my main language for a while.
Read the <a href="https://doc.rust-lang.org/book/">book</a> first.</p>

<h2>What worked</h2>

<ol>
<li>Small crates</li><li>Typed errors</li>
</ol>

<blockquote>Make it work, make it right, make it fast.</blockquote>

<pre><code>cargo new hello</code></pre>

[embed]https://www.youtube.com/watch?v=abc123[/embed]"#;

#[cfg(test)]
pub const DRAFT_DOCUMENT: &str = r#"title: Draft post
# --- Content ---
[paragraph]
Nothing to see yet.
[/paragraph]
"#;
