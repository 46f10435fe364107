/// Page start. `REPORT_TITLE` and `REPORT_SUBTITLE` are replaced with
/// escaped text.
pub const PAGE_HEAD: &str = r##"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>REPORT_TITLE</title>
<style>
body { font-family: Helvetica, Arial, sans-serif; font-size: 10pt; margin: 2em; color: #222; }
h1 { font-size: 18pt; margin-bottom: 0.2em; }
h2 { font-size: 13pt; margin-top: 2em; border-bottom: 0.5pt solid #999; }
p.subtitle { color: #777; margin-top: 0; }
table { border-collapse: collapse; margin-bottom: 0.5em; }
th, td { padding: 3px 8px; text-align: left; vertical-align: top; }
th { background: #f0f0f0; border-bottom: 1pt solid #000; }
.right { text-align: right; }
.nowrap { white-space: nowrap; }
.pct { color: #555; text-align: right; }
.bottom td { border-top: 1pt solid #000; font-weight: bold; }
table.items { font-size: 8pt; color: #555; margin: 0 0 0.5em 1.5em; }
table.items td { padding: 1px 6px; }
canvas { display: block; margin: 0.5em 0 1em 0; }
</style>
<script>
function pieChart(id, slices) {
  var canvas = document.getElementById(id);
  if (!canvas || !canvas.getContext) { return; }
  var ctx = canvas.getContext("2d");
  var total = slices.reduce(function (sum, s) { return sum + s.number; }, 0);
  if (total <= 0) { return; }
  var radius = canvas.height / 2 - 4;
  var cx = radius + 4, cy = canvas.height / 2;
  var start = -Math.PI / 2;
  ctx.font = "11px Helvetica, Arial, sans-serif";
  ctx.textBaseline = "middle";
  slices.forEach(function (slice, i) {
    var angle = 2 * Math.PI * slice.number / total;
    ctx.beginPath();
    ctx.moveTo(cx, cy);
    ctx.arc(cx, cy, radius, start, start + angle);
    ctx.closePath();
    ctx.fillStyle = slice.color;
    ctx.fill();
    start += angle;

    var y = 12 + i * 18;
    ctx.fillRect(2 * radius + 24, y - 6, 12, 12);
    ctx.fillStyle = "#222";
    var pct = Math.round(slice.number * 1000 / total) / 10;
    ctx.fillText(slice.name + " (" + pct + "%)", 2 * radius + 42, y);
  });
}
</script>
</head>
<body>
<h1>REPORT_TITLE</h1>
<p class="subtitle">REPORT_SUBTITLE</p>
"##;

pub const PAGE_FOOT: &str = "</body>\n</html>\n";

pub const CHART_WIDTH: u32 = 520;
pub const CHART_HEIGHT: u32 = 180;
