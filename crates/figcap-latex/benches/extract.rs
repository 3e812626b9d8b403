//! Benchmarks for LaTeX caption extraction.

use std::fmt::Write;
use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use figcap_core::{CaptionExtractor, GraphicSet};
use figcap_latex::{LatexExtractor, latex_to_text};

/// Build a paper body with `figures` single-graphic figures between prose.
fn create_paper(figures: usize) -> (String, GraphicSet) {
    let mut source = String::from("\\documentclass{article}\n\\newcommand{\\R}{\\mathbb{R}}\n");
    source.push_str("\\begin{document}\n");
    let mut graphics = Vec::with_capacity(figures);

    for i in 0..figures {
        writeln!(
            source,
            "Section {i} text with $\\alpha_{i} \\leq \\beta^2$ and a citation \\cite{{ref{i}}}.\n\
             \\begin{{itemize}}\\item [{i}] entry\\end{{itemize}}\n\
             \\begin{{figure}}[t]\n  \\centering\n  \\includegraphics[width=\\linewidth]{{figs/plot{i}}}\n  \
             \\caption[Short {i}]{{Caf\\'e \\textbf{{results}} for run {i}: $x^{{{i}}}$ vs.~\\ref{{tab:{i}}}.}}\n  \
             \\label{{fig:{i}}}\n\\end{{figure}}\n"
        )
        .unwrap();
        graphics.push(format!("figs/plot{i}.pdf"));
    }
    source.push_str("\\end{document}\n");

    (source, GraphicSet::new(graphics))
}

fn bench_extract(c: &mut Criterion) {
    let extractor = LatexExtractor::default();
    let mut group = c.benchmark_group("latex_extract");

    for figures in [10, 100, 1000] {
        let (source, graphics) = create_paper(figures);
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(figures), &source, |b, source| {
            b.iter(|| extractor.extract_captions("bench", black_box(source.as_bytes()), Some(&graphics)));
        });
    }

    group.finish();
}

fn bench_latex_to_text(c: &mut Criterion) {
    let caption = concat!(
        r#"Schr\"odinger's \emph{cat} in $\mathcal{H}$: \textbf{(a)} $\psi(x,t) = e^{-i\omega t}$, "#,
        r"\textit{(b)} Erd\H{o}s--R\'enyi graph \cite{er59}, see Fig.~\ref{fig:a}.",
    );

    c.bench_function("latex_to_text", |b| b.iter(|| latex_to_text(black_box(caption))));
}

criterion_group!(benches, bench_extract, bench_latex_to_text);
criterion_main!(benches);
